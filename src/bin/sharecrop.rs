use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use sharecrop::{
    DEFAULT_BUNDLE_MAX_FRAMES, DEFAULT_BUNDLE_MAX_TIME_GAP_SEC, DEFAULT_ROI_DETECTION_DURATION_SEC,
    DEFAULT_SSIM_THRESHOLD, DEFAULT_TARGET_FPS, FfmpegLogLevel, FrameBundle, PreprocessConfig,
    Preprocessor, ProgressCallback, ProgressInfo, RoiMetadata, ValidationError,
    build_frame_time_mapping, detect_roi, frame_map_path, write_frame_map,
};

const CLI_AFTER_HELP: &str = "Examples:\n  sharecrop preprocess standup.mp4 > standup_frame_map.txt\n  sharecrop preprocess standup.mp4 --target-fps 2 --save-frames frames --progress\n  sharecrop batch recordings/*.mp4 --output-dir maps\n  sharecrop roi standup.mp4 --json\n  sharecrop completions zsh > _sharecrop";

#[derive(Debug, Parser)]
#[command(
    name = "sharecrop",
    version,
    about = "Crop, deduplicate, and bundle screen-share recordings for OCR",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while decoding.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true, default_value = "error")]
    ffmpeg_log_level: FfmpegLogLevel,
}

/// Pipeline knobs shared by every command that runs it.
#[derive(Debug, Args, Clone)]
struct PipelineOptions {
    /// Sampling rate in frames per second.
    #[arg(long, default_value_t = DEFAULT_TARGET_FPS)]
    target_fps: f64,

    /// Seconds from the start of the video scanned for the content region.
    #[arg(long, default_value_t = DEFAULT_ROI_DETECTION_DURATION_SEC)]
    roi_seconds: f64,

    /// Minimum 1 - SSIM against the last kept frame for a frame to be kept.
    #[arg(long, default_value_t = DEFAULT_SSIM_THRESHOLD)]
    ssim_threshold: f64,

    /// Maximum frames per bundle.
    #[arg(long, default_value_t = DEFAULT_BUNDLE_MAX_FRAMES)]
    bundle_max_frames: usize,

    /// Maximum seconds between consecutive frames of a bundle.
    #[arg(long, default_value_t = DEFAULT_BUNDLE_MAX_TIME_GAP_SEC)]
    bundle_gap: f64,
}

impl PipelineOptions {
    fn to_config(&self) -> Result<PreprocessConfig, ValidationError> {
        PreprocessConfig::builder()
            .with_target_fps(self.target_fps)
            .with_roi_detection_duration_sec(self.roi_seconds)
            .with_ssim_threshold(self.ssim_threshold)
            .with_bundle_max_frames(self.bundle_max_frames)
            .with_bundle_max_time_gap_sec(self.bundle_gap)
            .build()
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline on one video and print its frame map.
    #[command(
        about = "Preprocess one recording",
        after_help = "Examples:\n  sharecrop preprocess standup.mp4\n  sharecrop preprocess standup.mp4 --output standup_frame_map.txt --json"
    )]
    Preprocess {
        /// Input video path.
        video: PathBuf,

        #[command(flatten)]
        pipeline: PipelineOptions,

        /// Write the frame map here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save every bundled frame as PNG into this directory.
        #[arg(long)]
        save_frames: Option<PathBuf>,

        /// Print a JSON summary of the bundles instead of the frame map.
        #[arg(long)]
        json: bool,
    },

    /// Preprocess many videos, writing a frame-map sidecar for each.
    #[command(
        about = "Preprocess a batch of recordings",
        after_help = "Videos that fail to preprocess are reported and skipped.\n\nExamples:\n  sharecrop batch a.mp4 b.mp4\n  sharecrop batch recordings/*.mp4 --output-dir maps"
    )]
    Batch {
        /// Input video paths.
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineOptions,

        /// Directory for `<stem>_frame_map.txt` files (default: next to each video).
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Detect and print the content region only.
    #[command(about = "Detect the content region")]
    Roi {
        /// Input video path.
        video: PathBuf,

        /// Seconds from the start of the video to scan.
        #[arg(long, default_value_t = DEFAULT_ROI_DETECTION_DURATION_SEC)]
        roi_seconds: f64,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Drives an `indicatif` bar from pipeline progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>14} {bar:40.cyan/blue} {pos}/{len}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = info.stage.to_string();
        if self.bar.message() != stage {
            self.bar.set_message(stage);
        }
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn roi_json(roi: &RoiMetadata) -> Value {
    json!({
        "x": roi.x(),
        "y": roi.y(),
        "width": roi.width(),
        "height": roi.height(),
        "confidence": roi.confidence(),
    })
}

fn bundles_json(video: &Path, bundles: &[FrameBundle]) -> Value {
    json!({
        "video": video.display().to_string(),
        "roi": bundles.first().map(|bundle| roi_json(bundle.roi())),
        "frame_count": bundles.iter().map(FrameBundle::len).sum::<usize>(),
        "bundles": bundles.iter().map(|bundle| json!({
            "frame_indices": bundle.frame_indices(),
            "timestamps_sec": bundle.timestamps_sec(),
            "duration_sec": bundle.duration_sec(),
        })).collect::<Vec<_>>(),
    })
}

fn bundle_frame_file_name(bundle_number: usize, frame_index: u64) -> String {
    format!("bundle_{bundle_number:03}_frame_{frame_index:06}.png")
}

fn save_bundle_frames(
    directory: &Path,
    bundles: &[FrameBundle],
) -> Result<usize, Box<dyn std::error::Error>> {
    fs::create_dir_all(directory)?;
    let mut saved = 0;
    for (bundle_number, bundle) in bundles.iter().enumerate() {
        for (image, &frame_index) in bundle.frames().iter().zip(bundle.frame_indices()) {
            let path = directory.join(bundle_frame_file_name(bundle_number, frame_index));
            image.save(&path)?;
            log::debug!("saved frame {frame_index} -> {}", path.display());
            saved += 1;
        }
    }
    Ok(saved)
}

fn build_preprocessor(
    pipeline: &PipelineOptions,
    global: &GlobalOptions,
) -> Result<(Preprocessor, Option<ProgressBar>), Box<dyn std::error::Error>> {
    let mut preprocessor = Preprocessor::new(pipeline.to_config()?);
    let mut bar = None;
    if global.progress {
        let progress = TerminalProgress::new()?;
        bar = Some(progress.bar.clone());
        preprocessor = preprocessor.with_progress(Arc::new(progress));
    }
    Ok((preprocessor, bar))
}

/// What happened to one video of a batch.
#[derive(Debug)]
enum BatchOutcome {
    /// The frame map was written here.
    Saved(PathBuf),
    /// The video was skipped; the batch carries on.
    Skipped(String),
}

fn process_batch_item(
    preprocessor: &Preprocessor,
    video: &Path,
    output_dir: Option<&Path>,
) -> BatchOutcome {
    match preprocessor.run(video) {
        Ok(bundles) => save_frame_map(video, output_dir, &bundles),
        Err(error) => {
            log::warn!("Preprocessing failed for {}: {error}", video.display());
            BatchOutcome::Skipped(format!("{}: {error}", video.display()))
        }
    }
}

fn save_frame_map(video: &Path, output_dir: Option<&Path>, bundles: &[FrameBundle]) -> BatchOutcome {
    let path = frame_map_path(video, output_dir);
    match write_frame_map(&path, &build_frame_time_mapping(bundles)) {
        Ok(()) => BatchOutcome::Saved(path),
        Err(error) => {
            log::warn!("Failed to write frame map {}: {error}", path.display());
            BatchOutcome::Skipped(format!("{}: cannot write {}: {error}", video.display(), path.display()))
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    sharecrop::set_ffmpeg_log_level(cli.global.ffmpeg_log_level);

    match cli.command {
        Commands::Preprocess {
            video,
            pipeline,
            output,
            save_frames,
            json,
        } => {
            let (preprocessor, bar) = build_preprocessor(&pipeline, &cli.global)?;
            let result = preprocessor.run(&video);
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let bundles = result?;

            if let Some(directory) = &save_frames {
                let saved = save_bundle_frames(directory, &bundles)?;
                eprintln!(
                    "{} {}",
                    "saved".green().bold(),
                    format!("{saved} frame(s) to {}", directory.display()).green()
                );
            }

            let mapping = build_frame_time_mapping(&bundles);
            if let Some(path) = &output {
                write_frame_map(path, &mapping)?;
                eprintln!("{} {}", "saved".green().bold(), path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&bundles_json(&video, &bundles))?);
            } else if output.is_none() {
                println!("{mapping}");
            }
        }
        Commands::Batch {
            videos,
            pipeline,
            output_dir,
        } => {
            let (preprocessor, bar) = build_preprocessor(&pipeline, &cli.global)?;
            let total = videos.len();
            let mut succeeded = 0_usize;

            for video in &videos {
                let outcome = process_batch_item(&preprocessor, video, output_dir.as_deref());
                let print = || match &outcome {
                    BatchOutcome::Saved(path) => {
                        println!("{} {}", "saved".green().bold(), path.display());
                    }
                    BatchOutcome::Skipped(reason) => {
                        eprintln!("{} {}", "skipped:".yellow().bold(), reason.yellow());
                    }
                };
                match &bar {
                    Some(bar) => bar.suspend(print),
                    None => print(),
                }
                if matches!(outcome, BatchOutcome::Saved(_)) {
                    succeeded += 1;
                }
            }

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            let summary = format!("Preprocessed {succeeded} of {total} video(s)");
            if succeeded == total {
                println!("{} {}", "success:".green().bold(), summary.green());
            } else {
                println!("{} {}", "done:".yellow().bold(), summary.yellow());
            }
        }
        Commands::Roi {
            video,
            roi_seconds,
            json,
        } => {
            let config = PreprocessConfig::builder()
                .with_roi_detection_duration_sec(roi_seconds)
                .build()?;
            let roi = detect_roi(&video, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&roi_json(&roi))?);
            } else {
                println!(
                    "ROI: {}x{} at ({}, {}), confidence {:.3}",
                    roi.width(),
                    roi.height(),
                    roi.x(),
                    roi.y(),
                    roi.confidence(),
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "sharecrop", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pipeline_defaults_build_the_default_config() {
        let cli = Cli::try_parse_from(["sharecrop", "preprocess", "clip.mp4"]).unwrap();
        let Commands::Preprocess { pipeline, .. } = cli.command else {
            panic!("expected preprocess");
        };
        assert_eq!(pipeline.to_config().unwrap(), PreprocessConfig::default());
        assert_eq!(cli.global.ffmpeg_log_level, FfmpegLogLevel::Error);
    }

    #[test]
    fn knobs_reach_the_config() {
        let cli = Cli::try_parse_from([
            "sharecrop",
            "preprocess",
            "clip.mp4",
            "--target-fps",
            "2",
            "--bundle-max-frames",
            "3",
            "--bundle-gap",
            "0",
        ])
        .unwrap();
        let Commands::Preprocess { pipeline, .. } = cli.command else {
            panic!("expected preprocess");
        };
        let config = pipeline.to_config().unwrap();
        assert_eq!(config.target_fps(), 2.0);
        assert_eq!(config.bundle_max_frames(), 3);
        assert_eq!(config.bundle_max_time_gap_sec(), 0.0);
    }

    #[test]
    fn invalid_knob_fails_validation() {
        let cli =
            Cli::try_parse_from(["sharecrop", "batch", "a.mp4", "--ssim-threshold", "0"]).unwrap();
        let Commands::Batch { pipeline, .. } = cli.command else {
            panic!("expected batch");
        };
        assert!(pipeline.to_config().is_err());
    }

    #[test]
    fn batch_requires_a_video() {
        assert!(Cli::try_parse_from(["sharecrop", "batch"]).is_err());
    }

    #[test]
    fn ffmpeg_log_level_is_parsed() {
        let cli = Cli::try_parse_from([
            "sharecrop",
            "--ffmpeg-log-level",
            "quiet",
            "roi",
            "clip.mp4",
        ])
        .unwrap();
        assert_eq!(cli.global.ffmpeg_log_level, FfmpegLogLevel::Quiet);
        assert!(
            Cli::try_parse_from(["sharecrop", "--ffmpeg-log-level", "loud", "roi", "clip.mp4"])
                .is_err()
        );
    }

    #[test]
    fn batch_item_with_missing_video_is_skipped() {
        let outcome = process_batch_item(
            &Preprocessor::default(),
            Path::new("/nonexistent/recording.mp4"),
            None,
        );
        assert!(matches!(outcome, BatchOutcome::Skipped(reason) if reason.contains("recording.mp4")));
    }

    #[test]
    fn unwritable_frame_map_is_skipped_not_fatal() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        // A regular file where the output directory should be.
        let blocker = temporary_directory.path().join("maps");
        fs::write(&blocker, b"not a directory").expect("Failed to write blocker file");

        let outcome = save_frame_map(Path::new("call.mp4"), Some(&blocker), &[]);
        assert!(matches!(outcome, BatchOutcome::Skipped(_)), "{outcome:?}");

        let outcome = save_frame_map(Path::new("call.mp4"), Some(temporary_directory.path()), &[]);
        let BatchOutcome::Saved(path) = outcome else {
            panic!("expected the frame map to be written");
        };
        assert_eq!(fs::read_to_string(path).unwrap(), "Frame→Time (s):\n");
    }

    #[test]
    fn frame_file_names_are_zero_padded() {
        assert_eq!(bundle_frame_file_name(2, 45), "bundle_002_frame_000045.png");
    }
}
