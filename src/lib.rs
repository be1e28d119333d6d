//! # sharecrop
//!
//! Turn a screen-share recording into a compact set of time-anchored frames
//! ready for OCR or captioning.
//!
//! The pipeline runs four stages over a local video file:
//!
//! 1. **ROI detection**: find the shared content inside letterboxing or
//!    window chrome by scanning the opening seconds of the video.
//! 2. **Frame sampling**: decode the whole video, keep frames at a fixed
//!    cadence, and crop each to the ROI.
//! 3. **Change gating**: drop frames whose SSIM against the last kept frame
//!    says nothing meaningful changed.
//! 4. **Bundling**: group the survivors into small, time-bounded bundles.
//!
//! A formatter then renders the surviving frame indices and timestamps as a
//! plain-text report.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sharecrop::{build_frame_time_mapping, preprocess_video};
//!
//! let bundles = preprocess_video("standup.mp4", None)?;
//! for bundle in &bundles {
//!     println!("{} frame(s) over {:.1} s", bundle.len(), bundle.duration_sec());
//! }
//! println!("{}", build_frame_time_mapping(&bundles));
//! # Ok::<(), sharecrop::PreprocessingError>(())
//! ```
//!
//! ### Custom configuration
//!
//! ```no_run
//! use sharecrop::{PreprocessConfig, preprocess_video};
//!
//! let config = PreprocessConfig::builder()
//!     .with_target_fps(2.0)
//!     .with_ssim_threshold(0.02)
//!     .with_bundle_max_frames(4)
//!     .build()?;
//! let bundles = preprocess_video("standup.mp4", Some(&config))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the build host; they
//! are linked through [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).

pub mod bundle;
pub mod config;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod gate;
pub mod mapping;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod roi;
pub mod sampler;
pub mod source;
pub mod ssim;

pub use bundle::{FrameBundle, create_bundles};
pub use config::{
    DEFAULT_BUNDLE_MAX_FRAMES, DEFAULT_BUNDLE_MAX_TIME_GAP_SEC, DEFAULT_ROI_DETECTION_DURATION_SEC,
    DEFAULT_SSIM_THRESHOLD, DEFAULT_TARGET_FPS, PreprocessConfig, PreprocessConfigBuilder,
};
pub use error::{PreprocessingError, ValidationError};
pub use ffmpeg::{FfmpegLogLevel, UnknownLogLevel, set_ffmpeg_log_level};
pub use gate::gate_frames_by_ssim;
pub use mapping::{
    FRAME_MAP_HEADER, FRAME_MAP_SUFFIX, build_frame_time_mapping, frame_map_path, write_frame_map,
};
pub use metadata::{RoiMetadata, VideoMetadata};
pub use pipeline::{Preprocessor, preprocess_video};
pub use progress::{PipelineStage, ProgressCallback, ProgressInfo};
pub use roi::detect_roi;
pub use sampler::{SampledFrame, extract_frames_at_fps};
pub use source::{FALLBACK_FPS, VideoSource};
pub use ssim::{DATA_RANGE_U8, WINDOW_SIZE, structural_similarity};
