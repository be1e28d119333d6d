//! Preprocessing configuration.
//!
//! [`PreprocessConfig`] holds the five numeric knobs that drive the
//! pipeline. It is immutable once built, and every invariant is checked at
//! construction time so a bad value never reaches the decoder.
//!
//! # Example
//!
//! ```
//! use sharecrop::PreprocessConfig;
//!
//! let config = PreprocessConfig::builder()
//!     .with_target_fps(4.0)
//!     .with_bundle_max_frames(8)
//!     .build()?;
//! assert_eq!(config.target_fps(), 4.0);
//! assert_eq!(config.ssim_threshold(), 0.005);
//! # Ok::<(), sharecrop::ValidationError>(())
//! ```

use crate::error::ValidationError;

/// Default sampling rate in frames per second.
pub const DEFAULT_TARGET_FPS: f64 = 6.0;
/// Default length of the ROI detection window in seconds.
pub const DEFAULT_ROI_DETECTION_DURATION_SEC: f64 = 10.0;
/// Default minimum change score (`1 - SSIM`) for a frame to be kept.
pub const DEFAULT_SSIM_THRESHOLD: f64 = 0.005;
/// Default maximum number of frames per bundle.
pub const DEFAULT_BUNDLE_MAX_FRAMES: usize = 6;
/// Default maximum gap in seconds between consecutive frames of a bundle.
pub const DEFAULT_BUNDLE_MAX_TIME_GAP_SEC: f64 = 2.0;

/// Validated configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    target_fps: f64,
    roi_detection_duration_sec: f64,
    ssim_threshold: f64,
    bundle_max_frames: usize,
    bundle_max_time_gap_sec: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            roi_detection_duration_sec: DEFAULT_ROI_DETECTION_DURATION_SEC,
            ssim_threshold: DEFAULT_SSIM_THRESHOLD,
            bundle_max_frames: DEFAULT_BUNDLE_MAX_FRAMES,
            bundle_max_time_gap_sec: DEFAULT_BUNDLE_MAX_TIME_GAP_SEC,
        }
    }
}

impl PreprocessConfig {
    /// Create a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NonPositive`] if `target_fps`,
    ///   `roi_detection_duration_sec`, `ssim_threshold`, or
    ///   `bundle_max_frames` is not strictly positive.
    /// - [`ValidationError::Negative`] if `bundle_max_time_gap_sec` is
    ///   negative.
    ///
    /// NaN fails every check it is subjected to.
    pub fn new(
        target_fps: f64,
        roi_detection_duration_sec: f64,
        ssim_threshold: f64,
        bundle_max_frames: usize,
        bundle_max_time_gap_sec: f64,
    ) -> Result<Self, ValidationError> {
        require_positive("target_fps", target_fps)?;
        require_positive("roi_detection_duration_sec", roi_detection_duration_sec)?;
        require_positive("ssim_threshold", ssim_threshold)?;
        if bundle_max_frames == 0 {
            return Err(ValidationError::NonPositive {
                field: "bundle_max_frames",
                value: 0.0,
            });
        }
        if bundle_max_time_gap_sec.is_nan() || bundle_max_time_gap_sec < 0.0 {
            return Err(ValidationError::Negative {
                field: "bundle_max_time_gap_sec",
                value: bundle_max_time_gap_sec,
            });
        }

        Ok(Self {
            target_fps,
            roi_detection_duration_sec,
            ssim_threshold,
            bundle_max_frames,
            bundle_max_time_gap_sec,
        })
    }

    /// Start a builder seeded with the default values.
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Target sampling rate in frames per second.
    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    /// Seconds from the start of the video inspected by ROI detection.
    pub fn roi_detection_duration_sec(&self) -> f64 {
        self.roi_detection_duration_sec
    }

    /// Minimum `1 - SSIM` against the last kept frame for a frame to be kept.
    pub fn ssim_threshold(&self) -> f64 {
        self.ssim_threshold
    }

    /// Maximum number of frames in a single bundle.
    pub fn bundle_max_frames(&self) -> usize {
        self.bundle_max_frames
    }

    /// Maximum gap in seconds allowed between consecutive frames of a bundle.
    pub fn bundle_max_time_gap_sec(&self) -> f64 {
        self.bundle_max_time_gap_sec
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositive { field, value })
    }
}

/// Builder for [`PreprocessConfig`].
///
/// Unset knobs keep their defaults. Nothing is validated until
/// [`build`](PreprocessConfigBuilder::build) is called.
#[derive(Debug, Clone)]
pub struct PreprocessConfigBuilder {
    target_fps: f64,
    roi_detection_duration_sec: f64,
    ssim_threshold: f64,
    bundle_max_frames: usize,
    bundle_max_time_gap_sec: f64,
}

impl Default for PreprocessConfigBuilder {
    fn default() -> Self {
        let defaults = PreprocessConfig::default();
        Self {
            target_fps: defaults.target_fps,
            roi_detection_duration_sec: defaults.roi_detection_duration_sec,
            ssim_threshold: defaults.ssim_threshold,
            bundle_max_frames: defaults.bundle_max_frames,
            bundle_max_time_gap_sec: defaults.bundle_max_time_gap_sec,
        }
    }
}

impl PreprocessConfigBuilder {
    /// Set the target sampling rate.
    #[must_use]
    pub fn with_target_fps(mut self, fps: f64) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set how many seconds from the start are scanned for the ROI.
    #[must_use]
    pub fn with_roi_detection_duration_sec(mut self, seconds: f64) -> Self {
        self.roi_detection_duration_sec = seconds;
        self
    }

    /// Set the minimum change score for a frame to survive gating.
    #[must_use]
    pub fn with_ssim_threshold(mut self, threshold: f64) -> Self {
        self.ssim_threshold = threshold;
        self
    }

    /// Set the maximum number of frames per bundle.
    #[must_use]
    pub fn with_bundle_max_frames(mut self, frames: usize) -> Self {
        self.bundle_max_frames = frames;
        self
    }

    /// Set the maximum gap between consecutive frames of a bundle.
    #[must_use]
    pub fn with_bundle_max_time_gap_sec(mut self, seconds: f64) -> Self {
        self.bundle_max_time_gap_sec = seconds;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Same as [`PreprocessConfig::new`].
    pub fn build(self) -> Result<PreprocessConfig, ValidationError> {
        PreprocessConfig::new(
            self.target_fps,
            self.roi_detection_duration_sec,
            self.ssim_threshold,
            self.bundle_max_frames,
            self.bundle_max_time_gap_sec,
        )
    }
}
