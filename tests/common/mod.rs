//! Synthetic screen-share clips for integration tests.
//!
//! The clip is a 640×480 MPEG-4 AVI at 10 fps: a dark desktop with a bright
//! "document" panel. Dark text bars inside the panel move once, at the
//! three-second mark, so the clip has exactly one real content change.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    format::Pixel,
    frame::Video as VideoFrame,
};
use tempfile::TempDir;

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
pub const FPS: i32 = 10;
pub const SEGMENT_FRAMES: u32 = 30;
pub const TOTAL_FRAMES: u32 = SEGMENT_FRAMES * 2;

/// The bright panel, as `(x, y, width, height)`.
pub const PANEL: (u32, u32, u32, u32) = (80, 60, 480, 360);

const BACKGROUND_LUMA: u8 = 24;
const PANEL_LUMA: u8 = 232;
const TEXT_LUMA: u8 = 24;

/// Write the clip into a fresh temporary directory.
///
/// Returns `None`, after printing why, when this FFmpeg build cannot encode
/// MPEG-4 into AVI; callers should skip the test in that case.
pub fn screen_share_clip() -> Option<(TempDir, PathBuf)> {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("screenshare.avi");
    match write_clip(&path) {
        Ok(()) => Some((directory, path)),
        Err(error) => {
            eprintln!("Skipping: cannot encode synthetic clip ({error})");
            None
        }
    }
}

fn write_clip(path: &Path) -> Result<(), ffmpeg_next::Error> {
    ffmpeg_next::init()?;

    let codec = ffmpeg_next::encoder::find(Id::MPEG4).ok_or(ffmpeg_next::Error::EncoderNotFound)?;
    let mut output = ffmpeg_next::format::output(path)?;

    let time_base = Rational::new(1, FPS);
    let mut encoder = CodecContext::new_with_codec(codec).encoder().video()?;
    encoder.set_width(WIDTH);
    encoder.set_height(HEIGHT);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(time_base);
    encoder.set_frame_rate(Some(Rational::new(FPS, 1)));
    encoder.set_bit_rate(8_000_000);
    encoder.set_gop(FPS as u32);
    let mut encoder = encoder.open_as(codec)?;

    let stream_index = {
        let mut stream = output.add_stream(codec)?;
        stream.set_time_base(time_base);
        stream.set_rate(Rational::new(FPS, 1));
        stream.set_avg_frame_rate(Rational::new(FPS, 1));
        stream.set_parameters(&encoder);
        stream.index()
    };

    output.write_header()?;
    let stream_time_base = output
        .stream(stream_index)
        .map(|stream| stream.time_base())
        .unwrap_or(time_base);

    let mut packet = Packet::empty();
    for frame_number in 0..TOTAL_FRAMES {
        let mut frame = screen_frame(frame_number / SEGMENT_FRAMES);
        frame.set_pts(Some(i64::from(frame_number)));
        encoder.send_frame(&frame)?;
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.rescale_ts(time_base, stream_time_base);
            packet.write_interleaved(&mut output)?;
        }
    }

    encoder.send_eof()?;
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(time_base, stream_time_base);
        packet.write_interleaved(&mut output)?;
    }

    output.write_trailer()
}

/// Luma for one pixel of segment `segment`.
pub fn luma_at(segment: u32, x: u32, y: u32) -> u8 {
    let (panel_x, panel_y, panel_width, panel_height) = PANEL;
    let inside_panel =
        x >= panel_x && x < panel_x + panel_width && y >= panel_y && y < panel_y + panel_height;
    if !inside_panel {
        return BACKGROUND_LUMA;
    }

    // Three 16-pixel "lines of text", shifted down by 80 px in segment 1.
    let text_top = panel_y + 40 + segment * 80;
    let in_text_column = x >= panel_x + 40 && x < panel_x + 360;
    let in_text_row = (0..3).any(|line| {
        let top = text_top + line * 48;
        y >= top && y < top + 16
    });
    if in_text_column && in_text_row {
        TEXT_LUMA
    } else {
        PANEL_LUMA
    }
}

fn screen_frame(segment: u32) -> VideoFrame {
    let mut frame = VideoFrame::new(Pixel::YUV420P, WIDTH, HEIGHT);

    let stride = frame.stride(0);
    let luma = frame.data_mut(0);
    for y in 0..HEIGHT {
        let row = y as usize * stride;
        for x in 0..WIDTH {
            luma[row + x as usize] = luma_at(segment, x, y);
        }
    }

    for plane in 1..3 {
        frame.data_mut(plane).fill(128);
    }
    frame
}
