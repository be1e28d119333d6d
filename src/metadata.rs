//! Video and region-of-interest metadata types.
//!
//! [`VideoMetadata`] is probed once when a [`VideoSource`](crate::VideoSource)
//! is opened. [`RoiMetadata`] is produced once per run by
//! [`detect_roi`](crate::detect_roi) and shared by every bundle of that run.

use crate::error::ValidationError;

/// Metadata for the selected video stream.
///
/// Includes dimensions, the native frame rate reported by the container,
/// an estimated frame count, and the codec name.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second reported by the container, or `0.0` when unknown.
    ///
    /// Use [`VideoSource::native_fps`](crate::VideoSource::native_fps) for
    /// the value the pipeline actually works with.
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"mpeg4"`).
    pub codec: String,
}

/// One fixed rectangular content region for a whole video.
///
/// The rectangle is expressed in source-frame pixel coordinates. Width and
/// height are always positive and `confidence` is always within
/// `[0.0, 1.0]`; both are checked by [`RoiMetadata::new`].
///
/// # Example
///
/// ```
/// use sharecrop::RoiMetadata;
///
/// let roi = RoiMetadata::new(10, 20, 100, 200, 0.7)?;
/// assert_eq!(roi.width(), 100);
/// assert_eq!(roi.confidence(), 0.7);
/// # Ok::<(), sharecrop::ValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiMetadata {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    confidence: f64,
}

impl RoiMetadata {
    /// Create a validated ROI.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyDimension`] if `width` or `height` is zero.
    /// - [`ValidationError::ConfidenceOutOfRange`] if `confidence` is not in
    ///   `[0.0, 1.0]` (NaN included).
    pub fn new(
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::EmptyDimension { width, height });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            confidence,
        })
    }

    /// Left edge in source pixels.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Top edge in source pixels.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Width in pixels (always > 0).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (always > 0).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Detection confidence in `[0.0, 1.0]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Clamp the rectangle against a `frame_width` × `frame_height` frame.
    ///
    /// The origin is clamped to zero first and the far edges are then
    /// clipped to the frame. Returns `(x, y, width, height)`, or `None` when
    /// nothing of the rectangle remains inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x_start = u64::from(self.x.max(0).unsigned_abs());
        let y_start = u64::from(self.y.max(0).unsigned_abs());
        let x_end = u64::from(frame_width).min(x_start + u64::from(self.width));
        let y_end = u64::from(frame_height).min(y_start + u64::from(self.height));

        if x_end <= x_start || y_end <= y_start {
            return None;
        }

        // Both ends are bounded by the u32 frame size here.
        Some((
            x_start as u32,
            y_start as u32,
            (x_end - x_start) as u32,
            (y_end - y_start) as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_roi_exposes_values() {
        let roi = RoiMetadata::new(10, 20, 100, 200, 0.7).unwrap();
        assert_eq!(roi.x(), 10);
        assert_eq!(roi.y(), 20);
        assert_eq!(roi.width(), 100);
        assert_eq!(roi.height(), 200);
        assert_eq!(roi.confidence(), 0.7);
    }

    #[test]
    fn zero_width_is_rejected() {
        let error = RoiMetadata::new(0, 0, 0, 5, 0.5).unwrap_err();
        assert_eq!(
            error,
            ValidationError::EmptyDimension {
                width: 0,
                height: 5
            }
        );
    }

    #[test]
    fn zero_height_is_rejected() {
        assert!(RoiMetadata::new(0, 0, 5, 0, 0.5).is_err());
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        assert!(RoiMetadata::new(0, 0, 10, 5, 1.5).is_err());
        assert!(RoiMetadata::new(0, 0, 10, 5, -0.1).is_err());
        assert!(RoiMetadata::new(0, 0, 10, 5, f64::NAN).is_err());
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(RoiMetadata::new(0, 0, 10, 5, 0.0).is_ok());
        assert!(RoiMetadata::new(0, 0, 10, 5, 1.0).is_ok());
    }

    #[test]
    fn clamp_inside_frame_is_identity() {
        let roi = RoiMetadata::new(4, 6, 10, 20, 1.0).unwrap();
        assert_eq!(roi.clamp_to(100, 100), Some((4, 6, 10, 20)));
    }

    #[test]
    fn clamp_clips_far_edges() {
        let roi = RoiMetadata::new(90, 95, 50, 50, 1.0).unwrap();
        assert_eq!(roi.clamp_to(100, 100), Some((90, 95, 10, 5)));
    }

    #[test]
    fn clamp_negative_origin_keeps_width() {
        let roi = RoiMetadata::new(-5, -5, 10, 10, 1.0).unwrap();
        assert_eq!(roi.clamp_to(100, 100), Some((0, 0, 10, 10)));
    }

    #[test]
    fn clamp_outside_frame_is_empty() {
        let roi = RoiMetadata::new(200, 0, 10, 10, 1.0).unwrap();
        assert_eq!(roi.clamp_to(100, 100), None);
    }
}
