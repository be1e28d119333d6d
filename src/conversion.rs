//! Internal helpers for copying pixel data out of FFmpeg frames.

use ffmpeg_next::frame::Video as VideoFrame;
use image::{GrayImage, RgbImage};

use crate::error::PreprocessingError;

/// Copy a rectangular region of plane 0 into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp),
/// and the decoder reuses the frame storage for the next picture, so the
/// result is always a fresh allocation. The caller guarantees that the
/// region lies within the frame.
pub(crate) fn region_to_buffer(
    video_frame: &VideoFrame,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let column_offset = (x as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length && x == 0 {
        // No padding and full rows: copy the block at once.
        let start = (y as usize) * stride;
        return data[start..start + row_length * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_length * (height as usize));
    for row in (y as usize)..(y as usize + height as usize) {
        let row_start = row * stride + column_offset;
        buffer.extend_from_slice(&data[row_start..row_start + row_length]);
    }
    buffer
}

/// Copy a whole GRAY8 frame into a [`GrayImage`].
pub(crate) fn gray_frame_to_image(video_frame: &VideoFrame) -> Result<GrayImage, PreprocessingError> {
    let (width, height) = (video_frame.width(), video_frame.height());
    let buffer = region_to_buffer(video_frame, 0, 0, width, height, 1);
    GrayImage::from_raw(width, height, buffer).ok_or_else(|| {
        PreprocessingError::VideoDecodeError(
            "Failed to construct grayscale image from decoded frame data".to_string(),
        )
    })
}

/// Copy a region of an RGB24 frame into an [`RgbImage`].
pub(crate) fn rgb_region_to_image(
    video_frame: &VideoFrame,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RgbImage, PreprocessingError> {
    let buffer = region_to_buffer(video_frame, x, y, width, height, 3);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        PreprocessingError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}
