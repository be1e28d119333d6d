//! Error types for `sharecrop`.
//!
//! Two error families are kept deliberately apart:
//!
//! - [`PreprocessingError`] covers every failure that happens while the
//!   pipeline runs against a video (missing file, undecodable stream, no
//!   detectable content, ROI outside the decoded frame, nothing sampled).
//! - [`ValidationError`] covers invariant violations caught when a value
//!   object ([`PreprocessConfig`](crate::PreprocessConfig),
//!   [`RoiMetadata`](crate::RoiMetadata), [`FrameBundle`](crate::FrameBundle))
//!   is constructed, before any decoding starts.

use std::path::PathBuf;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

use crate::metadata::RoiMetadata;

/// The unified error type for pipeline execution.
///
/// Every stage of [`preprocess_video`](crate::preprocess_video) returns
/// `Result<T, PreprocessingError>`. All variants are unrecoverable for the
/// given video; callers processing a batch decide whether to skip the file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreprocessingError {
    /// The input path does not exist or is not a regular file.
    #[error("Video path does not exist or is not a file: {path}")]
    MissingInput {
        /// Path that was passed to the pipeline.
        path: PathBuf,
    },

    /// The container could not be opened by FFmpeg.
    #[error("Failed to open video at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`VideoSource::open`](crate::VideoSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file opened but carries no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// No contour scored anywhere in the detection window.
    #[error("ROI detection failed")]
    RoiDetectionFailed,

    /// The ROI clamped against the decoded frame is empty.
    #[error(
        "ROI is outside the frame bounds (roi {}x{} at ({}, {}), frame {frame_width}x{frame_height})",
        .roi.width(), .roi.height(), .roi.x(), .roi.y()
    )]
    RoiOutOfBounds {
        /// The ROI that was requested.
        roi: RoiMetadata,
        /// Width of the decoded frame.
        frame_width: u32,
        /// Height of the decoded frame.
        frame_height: u32,
    },

    /// Sampling produced no frames at all.
    #[error("No frames extracted")]
    NoFramesExtracted,
}

impl From<FfmpegError> for PreprocessingError {
    fn from(error: FfmpegError) -> Self {
        PreprocessingError::FfmpegError(error.to_string())
    }
}

/// Construction-time invariant violations for the crate's value objects.
///
/// These are raised immediately when a value is built and are never
/// converted into a [`PreprocessingError`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A knob that must be strictly positive was zero, negative, or NaN.
    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A knob that must be non-negative was negative or NaN.
    #[error("{field} must be non-negative (got {value})")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// An ROI with a zero width or height.
    #[error("ROI dimensions must be greater than 0 (got {width}x{height})")]
    EmptyDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// An ROI confidence outside `[0.0, 1.0]`.
    #[error("ROI confidence must be between 0.0 and 1.0 inclusive (got {0})")]
    ConfidenceOutOfRange(f64),

    /// The three parallel bundle sequences differ in length.
    #[error(
        "FrameBundle inputs must have equal lengths (frames={frames}, indices={indices}, timestamps={timestamps})"
    )]
    BundleLengthMismatch {
        /// Number of images.
        frames: usize,
        /// Number of frame indices.
        indices: usize,
        /// Number of timestamps.
        timestamps: usize,
    },

    /// A bundle with no frames.
    #[error("FrameBundle must contain at least one frame")]
    EmptyBundle,
}
