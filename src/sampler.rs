//! Fixed-cadence frame sampling.
//!
//! [`extract_frames_at_fps`] decodes the whole video, keeps every
//! `round(native_fps / target_fps)`-th frame, and crops each kept frame to
//! the detected ROI.

use std::{ops::ControlFlow, path::Path};

use image::DynamicImage;

use crate::{
    conversion::rgb_region_to_image,
    error::PreprocessingError,
    metadata::RoiMetadata,
    progress::{NoOpProgress, PipelineStage, ProgressCallback, ProgressInfo},
    source::{PixelFormat, VideoSource},
};

/// One sampled, cropped frame.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Zero-based decode-order index in the source video.
    pub frame_index: u64,
    /// `frame_index / native_fps`, in seconds.
    pub timestamp_sec: f64,
    /// The frame cropped to the ROI. Owns its pixels.
    pub image: DynamicImage,
}

/// Sample and crop frames at roughly `target_fps`.
///
/// Every `max(1, round(native_fps / target_fps))`-th decoded frame is kept,
/// with halves rounded to even (15 fps at 6 fps keeps every second frame).
/// Timestamps are derived from the native rate (`index / native_fps`), so
/// they are exact for constant-frame-rate sources and approximate
/// otherwise. The ROI is clamped against each decoded frame before
/// cropping, and the cropped pixels are copied out of the decoder's buffer.
///
/// `target_fps` is expected to come from a validated
/// [`PreprocessConfig`](crate::PreprocessConfig); a non-positive value keeps
/// every frame.
///
/// # Errors
///
/// - Any error from [`VideoSource::open`].
/// - [`PreprocessingError::RoiOutOfBounds`] if the clamped ROI is empty.
/// - [`PreprocessingError::NoFramesExtracted`] if nothing was sampled.
pub fn extract_frames_at_fps<P: AsRef<Path>>(
    video_path: P,
    target_fps: f64,
    roi: &RoiMetadata,
) -> Result<Vec<SampledFrame>, PreprocessingError> {
    let mut source = VideoSource::open(video_path)?;
    extract_frames_in(&mut source, target_fps, roi, &NoOpProgress)
}

/// Run sampling on an already opened source.
pub(crate) fn extract_frames_in(
    source: &mut VideoSource,
    target_fps: f64,
    roi: &RoiMetadata,
    progress: &dyn ProgressCallback,
) -> Result<Vec<SampledFrame>, PreprocessingError> {
    let native_fps = source.native_fps();
    let skip = sampling_step(native_fps, target_fps);
    let expected_total = source.metadata().frame_count;
    log::debug!("Sampling every {skip} frame(s) ({native_fps:.3} fps -> {target_fps} fps)");

    let mut frames = Vec::new();

    let decoded = source.for_each_frame(PixelFormat::Rgb8, skip, |index, frame| {
        let (x, y, width, height) = roi.clamp_to(frame.width(), frame.height()).ok_or(
            PreprocessingError::RoiOutOfBounds {
                roi: *roi,
                frame_width: frame.width(),
                frame_height: frame.height(),
            },
        )?;

        let image = rgb_region_to_image(frame, x, y, width, height)?;
        frames.push(SampledFrame {
            frame_index: index,
            timestamp_sec: index as f64 / native_fps,
            image: DynamicImage::ImageRgb8(image),
        });

        progress.on_progress(&ProgressInfo {
            stage: PipelineStage::FrameSampling,
            current: index + 1,
            total: (expected_total > 0).then_some(expected_total),
        });
        Ok(ControlFlow::Continue(()))
    })?;

    log::debug!("Sampled {} of {decoded} decoded frame(s)", frames.len());

    if frames.is_empty() {
        return Err(PreprocessingError::NoFramesExtracted);
    }
    Ok(frames)
}

/// `max(1, round(native_fps / target_fps))`, ties to even.
pub(crate) fn sampling_step(native_fps: f64, target_fps: f64) -> u64 {
    let ratio = (native_fps / target_fps).round_ties_even();
    if ratio.is_finite() && ratio >= 1.0 {
        ratio as u64
    } else if ratio.is_infinite() && ratio > 0.0 {
        u64::MAX
    } else {
        1
    }
}
