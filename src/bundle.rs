//! Frame bundles and the bundler.
//!
//! A [`FrameBundle`] is a contiguous, size- and time-bounded group of kept
//! frames that share one [`RoiMetadata`]. [`create_bundles`] turns the gated
//! frame list into an ordered, frame-disjoint list of bundles.

use image::DynamicImage;

use crate::{
    config::PreprocessConfig, error::ValidationError, metadata::RoiMetadata,
    sampler::SampledFrame,
};

/// An ordered group of cropped frames with their source indices and times.
///
/// The three sequences always have equal, non-zero length, and position `i`
/// in each refers to the same physical frame.
#[derive(Debug, Clone)]
pub struct FrameBundle {
    frames: Vec<DynamicImage>,
    frame_indices: Vec<u64>,
    timestamps_sec: Vec<f64>,
    roi: RoiMetadata,
}

impl FrameBundle {
    /// Build a bundle from parallel sequences.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::BundleLengthMismatch`] if the sequences differ in
    ///   length.
    /// - [`ValidationError::EmptyBundle`] if they are all empty.
    pub fn new(
        frames: Vec<DynamicImage>,
        frame_indices: Vec<u64>,
        timestamps_sec: Vec<f64>,
        roi: RoiMetadata,
    ) -> Result<Self, ValidationError> {
        if frames.len() != frame_indices.len() || frames.len() != timestamps_sec.len() {
            return Err(ValidationError::BundleLengthMismatch {
                frames: frames.len(),
                indices: frame_indices.len(),
                timestamps: timestamps_sec.len(),
            });
        }
        if frames.is_empty() {
            return Err(ValidationError::EmptyBundle);
        }

        Ok(Self {
            frames,
            frame_indices,
            timestamps_sec,
            roi,
        })
    }

    /// Cropped images in chronological order.
    pub fn frames(&self) -> &[DynamicImage] {
        &self.frames
    }

    /// Zero-based decode-order index of each frame in the source video.
    pub fn frame_indices(&self) -> &[u64] {
        &self.frame_indices
    }

    /// Timestamp of each frame in seconds.
    pub fn timestamps_sec(&self) -> &[f64] {
        &self.timestamps_sec
    }

    /// The region every frame was cropped to.
    pub fn roi(&self) -> &RoiMetadata {
        &self.roi
    }

    /// Number of frames in the bundle (always at least one).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; bundles cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time between the first and last frame, or `0.0` for a single frame.
    pub fn duration_sec(&self) -> f64 {
        match (self.timestamps_sec.first(), self.timestamps_sec.last()) {
            (Some(first), Some(last)) if self.timestamps_sec.len() > 1 => last - first,
            _ => 0.0,
        }
    }

    /// Iterate over `(frame_index, timestamp_sec)` pairs.
    pub fn frame_times(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.frame_indices
            .iter()
            .copied()
            .zip(self.timestamps_sec.iter().copied())
    }

    /// Take ownership of the images.
    pub fn into_frames(self) -> Vec<DynamicImage> {
        self.frames
    }
}

/// The bundle currently being filled by [`create_bundles`].
#[derive(Default)]
struct PendingBundle {
    frames: Vec<DynamicImage>,
    frame_indices: Vec<u64>,
    timestamps_sec: Vec<f64>,
}

impl PendingBundle {
    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn should_flush_before(&self, timestamp_sec: f64, config: &PreprocessConfig) -> bool {
        let Some(&last) = self.timestamps_sec.last() else {
            return false;
        };
        let exceeds_length = self.frames.len() >= config.bundle_max_frames();
        let exceeds_gap = timestamp_sec - last > config.bundle_max_time_gap_sec();
        exceeds_length || exceeds_gap
    }

    fn push(&mut self, frame: SampledFrame) {
        self.frames.push(frame.image);
        self.frame_indices.push(frame.frame_index);
        self.timestamps_sec.push(frame.timestamp_sec);
    }

    /// Emit the accumulated frames, leaving `self` empty.
    fn take(&mut self, roi: RoiMetadata) -> FrameBundle {
        let pending = std::mem::take(self);
        // The three vectors grow together in `push`, so lengths always agree.
        FrameBundle {
            frames: pending.frames,
            frame_indices: pending.frame_indices,
            timestamps_sec: pending.timestamps_sec,
            roi,
        }
    }
}

/// Group gated frames into ordered, size- and time-bounded bundles.
///
/// Before a frame is appended to a non-empty bundle, the bundle is flushed
/// when it already holds `bundle_max_frames` frames **or** the frame's
/// timestamp is more than `bundle_max_time_gap_sec` after the bundle's last
/// frame. Both triggers are evaluated together against the same incoming
/// frame. Every input frame ends up in exactly one bundle; empty input
/// yields no bundles.
///
/// # Example
///
/// ```
/// use image::DynamicImage;
/// use sharecrop::{PreprocessConfig, RoiMetadata, SampledFrame, create_bundles};
///
/// let roi = RoiMetadata::new(0, 0, 2, 2, 1.0)?;
/// let frames: Vec<SampledFrame> = [0.0, 0.5, 5.0]
///     .into_iter()
///     .enumerate()
///     .map(|(index, timestamp_sec)| SampledFrame {
///         frame_index: index as u64,
///         timestamp_sec,
///         image: DynamicImage::new_rgb8(2, 2),
///     })
///     .collect();
///
/// let bundles = create_bundles(frames, &roi, &PreprocessConfig::default());
/// assert_eq!(bundles.len(), 2);
/// # Ok::<(), sharecrop::ValidationError>(())
/// ```
pub fn create_bundles(
    gated_frames: Vec<SampledFrame>,
    roi: &RoiMetadata,
    config: &PreprocessConfig,
) -> Vec<FrameBundle> {
    let mut bundles = Vec::new();
    let mut current = PendingBundle::default();

    for frame in gated_frames {
        if current.should_flush_before(frame.timestamp_sec, config) {
            bundles.push(current.take(*roi));
        }
        current.push(frame);
    }

    if !current.is_empty() {
        bundles.push(current.take(*roi));
    }

    log::debug!("Created {} bundle(s)", bundles.len());
    bundles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi() -> RoiMetadata {
        RoiMetadata::new(0, 0, 2, 2, 1.0).unwrap()
    }

    fn frame(frame_index: u64, timestamp_sec: f64) -> SampledFrame {
        SampledFrame {
            frame_index,
            timestamp_sec,
            image: DynamicImage::new_rgb8(2, 2),
        }
    }

    fn config(max_frames: usize, max_gap: f64) -> PreprocessConfig {
        PreprocessConfig::builder()
            .with_bundle_max_frames(max_frames)
            .with_bundle_max_time_gap_sec(max_gap)
            .build()
            .unwrap()
    }

    #[test]
    fn single_frame_bundle_has_zero_duration() {
        let bundle =
            FrameBundle::new(vec![DynamicImage::new_rgb8(2, 2)], vec![0], vec![0.0], roi())
                .unwrap();
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.duration_sec(), 0.0);
    }

    #[test]
    fn duration_spans_first_to_last() {
        let image = DynamicImage::new_rgb8(2, 2);
        let bundle =
            FrameBundle::new(vec![image.clone(), image], vec![0, 1], vec![0.0, 1.5], roi())
                .unwrap();
        assert!((bundle.duration_sec() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let error = FrameBundle::new(
            vec![DynamicImage::new_rgb8(2, 2)],
            vec![0, 1],
            vec![0.0],
            roi(),
        )
        .unwrap_err();
        assert_eq!(
            error,
            ValidationError::BundleLengthMismatch {
                frames: 1,
                indices: 2,
                timestamps: 1
            }
        );
    }

    #[test]
    fn empty_bundle_is_rejected() {
        let error = FrameBundle::new(Vec::new(), Vec::new(), Vec::new(), roi()).unwrap_err();
        assert_eq!(error, ValidationError::EmptyBundle);
    }

    #[test]
    fn respects_max_frames() {
        let frames = (0..5).map(|index| frame(index, index as f64 * 0.1)).collect();
        let bundles = create_bundles(frames, &roi(), &config(2, 2.0));
        assert_eq!(bundles.len(), 3);
        assert!(bundles.iter().all(|bundle| bundle.len() <= 2));
        assert_eq!(bundles[2].frame_indices(), &[4]);
    }

    #[test]
    fn splits_on_time_gap() {
        let frames = vec![frame(0, 0.0), frame(1, 0.5), frame(2, 5.0)];
        let bundles = create_bundles(frames, &roi(), &config(6, 2.0));
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].frame_indices(), &[0, 1]);
        assert_eq!(bundles[1].frame_indices(), &[2]);
    }

    #[test]
    fn gap_equal_to_limit_does_not_split() {
        let frames = vec![frame(0, 0.0), frame(1, 2.0)];
        let bundles = create_bundles(frames, &roi(), &config(6, 2.0));
        assert_eq!(bundles.len(), 1);
    }

    #[test]
    fn simultaneous_triggers_flush_once() {
        // The third frame both overflows the size limit and exceeds the gap.
        let frames = vec![frame(0, 0.0), frame(1, 0.1), frame(2, 9.0), frame(3, 9.1)];
        let bundles = create_bundles(frames, &roi(), &config(2, 2.0));
        let indices: Vec<&[u64]> = bundles.iter().map(FrameBundle::frame_indices).collect();
        assert_eq!(indices, vec![&[0, 1][..], &[2, 3][..]]);
    }

    #[test]
    fn zero_gap_splits_every_distinct_timestamp() {
        let frames = vec![frame(0, 0.0), frame(1, 0.0), frame(2, 0.5)];
        let bundles = create_bundles(frames, &roi(), &config(6, 0.0));
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].frame_indices(), &[0, 1]);
    }

    #[test]
    fn every_frame_appears_exactly_once() {
        let frames = (0..17).map(|index| frame(index, index as f64 * 0.7)).collect();
        let bundles = create_bundles(frames, &roi(), &config(3, 1.0));
        let flattened: Vec<u64> = bundles
            .iter()
            .flat_map(|bundle| bundle.frame_indices().to_vec())
            .collect();
        assert_eq!(flattened, (0..17).collect::<Vec<_>>());
        assert!(bundles.iter().all(|bundle| !bundle.is_empty()));
    }

    #[test]
    fn empty_input_yields_no_bundles() {
        let bundles = create_bundles(Vec::new(), &roi(), &PreprocessConfig::default());
        assert!(bundles.is_empty());
    }
}
