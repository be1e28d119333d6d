//! Frame-to-time report and its sidecar file.
//!
//! The report is the hand-off to downstream OCR and transcription: it lets
//! them anchor every kept frame back to a position in the recording. Its
//! layout is fixed:
//!
//! ```text
//! Frame→Time (s):
//! 0 -> 0.000
//! 5 -> 0.833
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::bundle::FrameBundle;

/// First line of every report.
pub const FRAME_MAP_HEADER: &str = "Frame→Time (s):";

/// Suffix appended to the video's file stem to name the sidecar.
pub const FRAME_MAP_SUFFIX: &str = "_frame_map.txt";

/// Render every bundled frame as `"{index} -> {seconds:.3}"`, sorted by
/// frame index, under [`FRAME_MAP_HEADER`].
///
/// Lines are joined with `\n` and there is no trailing newline. With no
/// bundles the output is the header alone.
///
/// # Example
///
/// ```
/// use image::DynamicImage;
/// use sharecrop::{FrameBundle, RoiMetadata, build_frame_time_mapping};
///
/// let roi = RoiMetadata::new(0, 0, 4, 4, 1.0)?;
/// let bundle = FrameBundle::new(vec![DynamicImage::new_rgb8(4, 4)], vec![5], vec![0.833], roi)?;
///
/// assert_eq!(build_frame_time_mapping(&[bundle]), "Frame→Time (s):\n5 -> 0.833");
/// # Ok::<(), sharecrop::ValidationError>(())
/// ```
pub fn build_frame_time_mapping(bundles: &[FrameBundle]) -> String {
    let mut pairs: Vec<(u64, f64)> = bundles.iter().flat_map(FrameBundle::frame_times).collect();
    pairs.sort_by_key(|&(index, _)| index);

    let mut lines = Vec::with_capacity(pairs.len() + 1);
    lines.push(FRAME_MAP_HEADER.to_string());
    lines.extend(
        pairs
            .into_iter()
            .map(|(index, timestamp)| format!("{index} -> {timestamp:.3}")),
    );
    lines.join("\n")
}

/// Where the sidecar for `video_path` goes.
///
/// `<output_dir>/<stem>_frame_map.txt`, or next to the video when
/// `output_dir` is `None`.
pub fn frame_map_path(video_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let directory = output_dir
        .map(Path::to_path_buf)
        .or_else(|| video_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    directory.join(format!("{stem}{FRAME_MAP_SUFFIX}"))
}

/// Write `mapping` to `path` followed by one newline, creating parent
/// directories as needed.
///
/// # Errors
///
/// Any I/O error from creating the directory or writing the file.
pub fn write_frame_map(path: &Path, mapping: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{mapping}\n"))?;
    log::debug!("Wrote frame map to {}", path.display());
    Ok(())
}
