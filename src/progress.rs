//! Progress reporting for pipeline runs.
//!
//! Attach a [`ProgressCallback`] to a [`Preprocessor`](crate::Preprocessor)
//! to observe each stage as it works through the video. Callbacks only
//! observe; there is no way to halt a run from inside one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sharecrop::{PreprocessConfig, Preprocessor, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{}] {}", info.stage, info.current);
//!     }
//! }
//!
//! let bundles = Preprocessor::new(PreprocessConfig::default())
//!     .with_progress(Arc::new(PrintProgress))
//!     .run("screenshare.mp4")?;
//! # Ok::<(), sharecrop::PreprocessingError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

/// The pipeline stage currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineStage {
    /// Scanning the opening window for the content region.
    RoiDetection,
    /// Decoding the whole video and cropping sampled frames.
    FrameSampling,
    /// Dropping near-duplicate frames.
    ChangeGating,
    /// Grouping kept frames into bundles.
    Bundling,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::RoiDetection => "roi detection",
            PipelineStage::FrameSampling => "frame sampling",
            PipelineStage::ChangeGating => "change gating",
            PipelineStage::Bundling => "bundling",
        };
        f.write_str(name)
    }
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which stage is reporting.
    pub stage: PipelineStage,
    /// Items processed so far in this stage (decoded frames during
    /// detection and sampling, frames otherwise).
    pub current: u64,
    /// Total items expected in this stage, if known ahead of time.
    pub total: Option<u64>,
}

/// Receives progress updates during a pipeline run.
pub trait ProgressCallback: Send + Sync {
    /// Called as each stage advances.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. This is the default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}
