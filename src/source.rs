//! Decode sessions over a video file.
//!
//! [`VideoSource`] opens a container with FFmpeg, picks the best video
//! stream, and caches its [`VideoMetadata`]. Each pipeline stage that needs
//! pixels opens its own source and walks the frames in decode order; the
//! FFmpeg contexts are released when the source is dropped, on success and
//! on error alike.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{error::PreprocessingError, metadata::VideoMetadata};

/// Frame rate assumed when the container does not report a usable one.
pub const FALLBACK_FPS: f64 = 30.0;

/// Pixel layout frames are converted to before a stage sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }
}

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use sharecrop::VideoSource;
///
/// let source = VideoSource::open("screenshare.mp4")?;
/// println!(
///     "{}x{} @ {:.2} fps",
///     source.metadata().width,
///     source.metadata().height,
///     source.native_fps(),
/// );
/// # Ok::<(), sharecrop::PreprocessingError>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    stream_index: usize,
    metadata: VideoMetadata,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("stream_index", &self.stream_index)
            .field("metadata", &self.metadata)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// # Errors
    ///
    /// - [`PreprocessingError::MissingInput`] if `path` is not a regular file.
    /// - [`PreprocessingError::FileOpen`] if FFmpeg cannot open or probe it.
    /// - [`PreprocessingError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PreprocessingError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        log::debug!("Opening video: {}", path.display());

        let open_error = |reason: String| PreprocessingError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let duration_microseconds = input_context.duration();
        let duration_seconds = if duration_microseconds > 0 {
            duration_microseconds as f64 / 1_000_000.0
        } else {
            0.0
        };

        let (stream_index, metadata) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(PreprocessingError::NoVideoStream)?;

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| {
                    open_error(format!("Failed to read video codec parameters: {error}"))
                })?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

            let frames_per_second = rational_to_fps(stream.avg_frame_rate())
                .or_else(|| rational_to_fps(stream.rate()))
                .unwrap_or(0.0);

            let frame_count = if stream.frames() > 0 {
                stream.frames() as u64
            } else if frames_per_second > 0.0 {
                (duration_seconds * frames_per_second) as u64
            } else {
                0
            };

            let codec = decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            (
                stream.index(),
                VideoMetadata {
                    width: decoder.width(),
                    height: decoder.height(),
                    frames_per_second,
                    frame_count,
                    codec,
                },
            )
        };

        log::debug!(
            "Video stream {stream_index}: {}x{} @ {:.3} fps [{}], ~{} frames",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
            metadata.frame_count,
        );

        Ok(Self {
            input_context,
            stream_index,
            metadata,
            path: path.to_path_buf(),
        })
    }

    /// Metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The frame rate the pipeline works with.
    ///
    /// This is the container's reported rate, or [`FALLBACK_FPS`] when that
    /// is missing or not positive.
    pub fn native_fps(&self) -> f64 {
        let fps = self.metadata.frames_per_second;
        if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            FALLBACK_FPS
        }
    }

    /// Decode every frame in order and hand every `step`-th one to `handler`.
    ///
    /// Frames are numbered by a zero-based decode-order counter. Only frames
    /// whose number is a multiple of `step` are converted to `pixel_format`
    /// and passed on; the rest are decoded and discarded. The borrowed frame
    /// is overwritten by the next one, so the handler must copy what it keeps.
    /// Returning [`ControlFlow::Break`] stops decoding early.
    ///
    /// Returns the number of frames decoded.
    pub(crate) fn for_each_frame<F>(
        &mut self,
        pixel_format: PixelFormat,
        step: u64,
        mut handler: F,
    ) -> Result<u64, PreprocessingError>
    where
        F: FnMut(u64, &VideoFrame) -> Result<ControlFlow<()>, PreprocessingError>,
    {
        let stream_index = self.stream_index;
        let stream = self
            .input_context
            .stream(stream_index)
            .ok_or(PreprocessingError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let mut session = DecodeSession {
            decoder,
            output_pixel: pixel_format.to_ffmpeg_pixel(),
            step: step.max(1),
            scaler: None,
            scaler_input: None,
            decoded_frame: VideoFrame::empty(),
            converted_frame: VideoFrame::empty(),
            counter: 0,
        };

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            session
                .decoder
                .send_packet(&packet)
                .map_err(|error| PreprocessingError::VideoDecodeError(error.to_string()))?;

            if session.drain(&mut handler)?.is_break() {
                return Ok(session.counter);
            }
        }

        // Flush the decoder.
        session.decoder.send_eof()?;
        session.drain(&mut handler)?;

        Ok(session.counter)
    }
}

/// Decoder state for one pass over the stream.
struct DecodeSession {
    decoder: VideoDecoder,
    output_pixel: Pixel,
    step: u64,
    scaler: Option<ScalingContext>,
    /// Source format and size the current scaler was built for.
    scaler_input: Option<(Pixel, u32, u32)>,
    decoded_frame: VideoFrame,
    converted_frame: VideoFrame,
    counter: u64,
}

impl DecodeSession {
    /// Receive every frame the decoder has ready.
    fn drain<F>(&mut self, handler: &mut F) -> Result<ControlFlow<()>, PreprocessingError>
    where
        F: FnMut(u64, &VideoFrame) -> Result<ControlFlow<()>, PreprocessingError>,
    {
        while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
            let index = self.counter;
            self.counter += 1;

            if index % self.step != 0 {
                continue;
            }

            self.ensure_scaler()?;
            let Some(scaler) = self.scaler.as_mut() else {
                return Err(PreprocessingError::VideoDecodeError(
                    "Pixel format converter unavailable".to_string(),
                ));
            };
            scaler.run(&self.decoded_frame, &mut self.converted_frame)?;

            if handler(index, &self.converted_frame)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Build (or rebuild) the converter for the current decoded frame.
    ///
    /// Some decoders change their output format or size mid-stream, so the
    /// converter is keyed on what the frame actually carries rather than on
    /// the codec parameters.
    fn ensure_scaler(&mut self) -> Result<(), PreprocessingError> {
        let input = (
            self.decoded_frame.format(),
            self.decoded_frame.width(),
            self.decoded_frame.height(),
        );
        if self.scaler.is_some() && self.scaler_input == Some(input) {
            return Ok(());
        }

        let (format, width, height) = input;
        log::debug!("Building converter {format:?} {width}x{height} -> {:?}", self.output_pixel);
        self.scaler = Some(ScalingContext::get(
            format,
            width,
            height,
            self.output_pixel,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?);
        self.scaler_input = Some(input);
        Ok(())
    }
}

fn rational_to_fps(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 {
        return None;
    }
    let fps = f64::from(rate.numerator()) / f64::from(rate.denominator());
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
