//! Change gating with SSIM.
//!
//! Screen shares are mostly static, so consecutive samples are often
//! pixel-identical or differ only by a cursor blink. Gating keeps a frame
//! only when it differs enough from the last frame that was kept.

use image::GrayImage;

use crate::{
    progress::{NoOpProgress, PipelineStage, ProgressCallback, ProgressInfo},
    sampler::SampledFrame,
    ssim::{DATA_RANGE_U8, structural_similarity},
};

/// Drop frames that are too similar to the last kept frame.
///
/// The first frame is always kept and becomes the reference. Each later
/// frame is converted to grayscale and compared with the reference; it is
/// kept, and becomes the new reference, when `1 − SSIM >= threshold`.
/// Comparison is always against the last *kept* frame, so a slow drift
/// eventually passes the gate even when each step is small.
///
/// Order is preserved and the frames are moved through without copying
/// their pixels.
///
/// # Example
///
/// ```
/// use image::{DynamicImage, GrayImage, Luma};
/// use sharecrop::{SampledFrame, gate_frames_by_ssim};
///
/// let frame = |frame_index: u64, value: u8| SampledFrame {
///     frame_index,
///     timestamp_sec: frame_index as f64,
///     image: DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([value]))),
/// };
///
/// let kept = gate_frames_by_ssim(vec![frame(0, 10), frame(1, 10), frame(2, 10)], 0.005);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].frame_index, 0);
/// ```
pub fn gate_frames_by_ssim(frames: Vec<SampledFrame>, threshold: f64) -> Vec<SampledFrame> {
    gate_frames_in(frames, threshold, &NoOpProgress)
}

pub(crate) fn gate_frames_in(
    frames: Vec<SampledFrame>,
    threshold: f64,
    progress: &dyn ProgressCallback,
) -> Vec<SampledFrame> {
    let total = frames.len() as u64;
    let mut kept = Vec::new();
    let mut reference: Option<GrayImage> = None;

    for (position, frame) in frames.into_iter().enumerate() {
        let gray = frame.image.to_luma8();

        let keep = match &reference {
            None => true,
            Some(previous) => {
                let dissimilarity = 1.0 - structural_similarity(previous, &gray, DATA_RANGE_U8);
                dissimilarity >= threshold
            }
        };

        if keep {
            reference = Some(gray);
            kept.push(frame);
        }

        progress.on_progress(&ProgressInfo {
            stage: PipelineStage::ChangeGating,
            current: position as u64 + 1,
            total: Some(total),
        });
    }

    log::debug!("Change gate kept {} of {total} frame(s)", kept.len());
    kept
}
