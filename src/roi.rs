//! Region-of-interest detection.
//!
//! Screen-share recordings usually surround the shared content with
//! letterboxing, window chrome, or a static background. [`detect_roi`] scans
//! the opening window of the video and commits to a single rectangle for the
//! whole clip: the bounding box of the best-scoring foreground blob seen in
//! any frame of that window.
//!
//! Each scanned frame is binarised with Otsu's threshold, closed with a 5×5
//! square structuring element so nearby active pixels merge into solid
//! blobs, and its external contours are scored as
//! `bounding_area × foreground_density`.

use std::{ops::ControlFlow, path::Path};

use image::GrayImage;
use imageproc::{
    contours::{BorderType, find_contours},
    contrast::{ThresholdType, otsu_level, threshold},
    distance_transform::Norm,
    morphology::close,
    point::Point,
};

use crate::{
    config::PreprocessConfig,
    conversion::gray_frame_to_image,
    error::PreprocessingError,
    metadata::RoiMetadata,
    progress::{NoOpProgress, PipelineStage, ProgressCallback, ProgressInfo},
    source::{PixelFormat, VideoSource},
};

/// Radius of the closing element; `LInf` radius 2 is a 5×5 square.
const CLOSE_RADIUS: u8 = 2;

/// Detect the primary content region of a screen-share video.
///
/// Scans up to `config.roi_detection_duration_sec()` seconds from the start
/// of the video and returns the highest-scoring rectangle seen across all
/// scanned frames. Ties keep the first rectangle found. `confidence` is the
/// score relative to the frame area, capped at `1.0`.
///
/// # Errors
///
/// - [`PreprocessingError::MissingInput`], [`PreprocessingError::FileOpen`]
///   or [`PreprocessingError::NoVideoStream`] if the video cannot be opened.
/// - [`PreprocessingError::RoiDetectionFailed`] if no contour is found in
///   the scanned window.
///
/// # Example
///
/// ```no_run
/// use sharecrop::{PreprocessConfig, detect_roi};
///
/// let roi = detect_roi("screenshare.mp4", &PreprocessConfig::default())?;
/// println!("{}x{} at ({}, {})", roi.width(), roi.height(), roi.x(), roi.y());
/// # Ok::<(), sharecrop::PreprocessingError>(())
/// ```
pub fn detect_roi<P: AsRef<Path>>(
    video_path: P,
    config: &PreprocessConfig,
) -> Result<RoiMetadata, PreprocessingError> {
    let mut source = VideoSource::open(video_path)?;
    detect_roi_in(&mut source, config, &NoOpProgress)
}

/// Run ROI detection on an already opened source.
pub(crate) fn detect_roi_in(
    source: &mut VideoSource,
    config: &PreprocessConfig,
    progress: &dyn ProgressCallback,
) -> Result<RoiMetadata, PreprocessingError> {
    let frame_budget = detection_frame_budget(source.native_fps(), config);
    log::debug!(
        "Detecting ROI over the first {frame_budget} frame(s) ({} s at {:.3} fps)",
        config.roi_detection_duration_sec(),
        source.native_fps(),
    );

    let mut best: Option<RoiCandidate> = None;

    source.for_each_frame(PixelFormat::Gray8, 1, |index, frame| {
        let gray = gray_frame_to_image(frame)?;
        scan_frame(&gray, &mut best);

        progress.on_progress(&ProgressInfo {
            stage: PipelineStage::RoiDetection,
            current: index + 1,
            total: Some(frame_budget),
        });

        Ok(if index + 1 >= frame_budget {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        })
    })?;

    let best = best.ok_or(PreprocessingError::RoiDetectionFailed)?;
    let roi = RoiMetadata::new(best.x, best.y, best.width, best.height, best.confidence)
        .map_err(|error| {
            log::warn!("Discarding invalid ROI candidate: {error}");
            PreprocessingError::RoiDetectionFailed
        })?;

    log::debug!(
        "Detected ROI {}x{} at ({}, {}), confidence {:.3}",
        roi.width(),
        roi.height(),
        roi.x(),
        roi.y(),
        roi.confidence(),
    );
    Ok(roi)
}

/// Number of frames inspected: `fps × duration`, or one second of frames
/// when that truncates to zero.
fn detection_frame_budget(native_fps: f64, config: &PreprocessConfig) -> u64 {
    let budget = (native_fps * config.roi_detection_duration_sec()) as u64;
    if budget > 0 {
        budget
    } else {
        (native_fps as u64).max(1)
    }
}

/// The best rectangle seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RoiCandidate {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    confidence: f64,
    score: f64,
}

/// An axis-aligned rectangle in mask coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundingBox {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Score every external contour of one frame against the running best.
fn scan_frame(gray: &GrayImage, best: &mut Option<RoiCandidate>) {
    let mask = foreground_mask(gray);
    let frame_area = f64::from(gray.width()) * f64::from(gray.height());

    for contour in find_contours::<i32>(&mask) {
        if !matches!(contour.border_type, BorderType::Outer) || contour.parent.is_some() {
            continue;
        }
        let Some(bounds) = bounding_box(&contour.points) else {
            continue;
        };

        let area = f64::from(bounds.width) * f64::from(bounds.height);
        let density = count_foreground(&mask, bounds) as f64 / area;
        let score = area * density;

        let best_score = best.map_or(-1.0, |candidate| candidate.score);
        if score > best_score {
            let confidence = if frame_area > 0.0 {
                (score / frame_area).min(1.0)
            } else {
                0.0
            };
            *best = Some(RoiCandidate {
                // Mask coordinates are bounded by the u32 frame size.
                x: bounds.x as i32,
                y: bounds.y as i32,
                width: bounds.width,
                height: bounds.height,
                confidence,
                score,
            });
        }
    }
}

/// Otsu binarisation followed by a 5×5 morphological close.
fn foreground_mask(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let binary = threshold(gray, level, ThresholdType::Binary);
    close(&binary, Norm::LInf, CLOSE_RADIUS)
}

fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in &points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    if min_x < 0 || min_y < 0 {
        return None;
    }

    Some(BoundingBox {
        x: min_x.unsigned_abs(),
        y: min_y.unsigned_abs(),
        width: (max_x - min_x).unsigned_abs() + 1,
        height: (max_y - min_y).unsigned_abs() + 1,
    })
}

fn count_foreground(mask: &GrayImage, bounds: BoundingBox) -> usize {
    let stride = mask.width() as usize;
    let raw = mask.as_raw();
    let (x, width) = (bounds.x as usize, bounds.width as usize);

    (bounds.y as usize..(bounds.y + bounds.height) as usize)
        .map(|row| {
            let start = row * stride + x;
            raw[start..start + width]
                .iter()
                .filter(|&&pixel| pixel != 0)
                .count()
        })
        .sum()
}
