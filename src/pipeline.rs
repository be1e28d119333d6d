//! End-to-end preprocessing.
//!
//! [`Preprocessor`] runs the four stages in order: ROI detection, frame
//! sampling, change gating, and bundling. Each decoding stage opens the
//! video independently, so no decoder state leaks between them.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
    sync::Arc,
    time::Instant,
};

use crate::{
    bundle::{FrameBundle, create_bundles},
    config::PreprocessConfig,
    error::PreprocessingError,
    gate::gate_frames_in,
    progress::{NoOpProgress, PipelineStage, ProgressCallback, ProgressInfo},
    roi::detect_roi_in,
    sampler::extract_frames_in,
    source::VideoSource,
};

/// Runs the preprocessing pipeline with a fixed configuration.
///
/// # Example
///
/// ```no_run
/// use sharecrop::{PreprocessConfig, Preprocessor, build_frame_time_mapping};
///
/// let config = PreprocessConfig::builder().with_target_fps(4.0).build()?;
/// let bundles = Preprocessor::new(config).run("screenshare.mp4")?;
/// println!("{}", build_frame_time_mapping(&bundles));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
    progress: Arc<dyn ProgressCallback>,
}

impl Debug for Preprocessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Preprocessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

impl Preprocessor {
    /// Create a preprocessor with the given configuration.
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Report stage progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The configuration every run uses.
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Preprocess one video into frame bundles.
    ///
    /// Bundles are ordered by time, every frame in them is cropped to the
    /// same ROI, and every kept frame appears in exactly one bundle. Runs
    /// are deterministic: the same file and configuration always yield the
    /// same bundles.
    ///
    /// # Errors
    ///
    /// Any [`PreprocessingError`] raised while opening, detecting, or
    /// sampling. The video is decoded again for each attempt; nothing is
    /// retried internally.
    pub fn run<P: AsRef<Path>>(&self, video_path: P) -> Result<Vec<FrameBundle>, PreprocessingError> {
        let video_path = video_path.as_ref();
        let started = Instant::now();
        log::info!("Preprocessing {}", video_path.display());

        let roi = {
            let mut source = VideoSource::open(video_path)?;
            detect_roi_in(&mut source, &self.config, self.progress.as_ref())?
        };
        log::info!(
            "ROI {}x{} at ({}, {}), confidence {:.3}",
            roi.width(),
            roi.height(),
            roi.x(),
            roi.y(),
            roi.confidence(),
        );

        let sampled = {
            let mut source = VideoSource::open(video_path)?;
            extract_frames_in(
                &mut source,
                self.config.target_fps(),
                &roi,
                self.progress.as_ref(),
            )?
        };
        let sampled_count = sampled.len();

        let gated = gate_frames_in(sampled, self.config.ssim_threshold(), self.progress.as_ref());
        if gated.is_empty() {
            log::warn!("No frames survived change gating");
            return Ok(Vec::new());
        }
        let gated_count = gated.len();

        let bundles = create_bundles(gated, &roi, &self.config);
        self.progress.on_progress(&ProgressInfo {
            stage: PipelineStage::Bundling,
            current: gated_count as u64,
            total: Some(gated_count as u64),
        });

        log::info!(
            "Sampled {sampled_count} frame(s), kept {gated_count}, produced {} bundle(s) in {:.2?}",
            bundles.len(),
            started.elapsed(),
        );
        Ok(bundles)
    }
}

/// Preprocess one video with `config`, or the defaults when `None`.
///
/// Shorthand for `Preprocessor::new(config).run(video_path)`.
///
/// # Errors
///
/// See [`Preprocessor::run`].
pub fn preprocess_video<P: AsRef<Path>>(
    video_path: P,
    config: Option<&PreprocessConfig>,
) -> Result<Vec<FrameBundle>, PreprocessingError> {
    let config = config.cloned().unwrap_or_default();
    Preprocessor::new(config).run(video_path)
}
