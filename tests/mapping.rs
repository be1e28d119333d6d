//! Frame-map formatting and sidecar tests.

use std::path::Path;

use image::DynamicImage;
use sharecrop::{
    FRAME_MAP_HEADER, FrameBundle, RoiMetadata, build_frame_time_mapping, frame_map_path,
    write_frame_map,
};

fn bundle(pairs: &[(u64, f64)]) -> FrameBundle {
    let roi = RoiMetadata::new(10, 10, 8, 8, 0.9).unwrap();
    FrameBundle::new(
        pairs.iter().map(|_| DynamicImage::new_rgb8(8, 8)).collect(),
        pairs.iter().map(|&(index, _)| index).collect(),
        pairs.iter().map(|&(_, timestamp)| timestamp).collect(),
        roi,
    )
    .unwrap()
}

#[test]
fn header_is_exact() {
    assert_eq!(FRAME_MAP_HEADER, "Frame→Time (s):");
}

#[test]
fn single_frame_report() {
    let mapping = build_frame_time_mapping(&[bundle(&[(5, 0.833)])]);
    assert!(mapping.contains("Frame→Time (s):"));
    assert!(mapping.contains("5 -> 0.833"));
}

#[test]
fn timestamps_have_three_decimals() {
    let mapping = build_frame_time_mapping(&[bundle(&[(0, 0.0), (7, 12.0), (9, 1.0 / 3.0)])]);
    assert_eq!(mapping, "Frame→Time (s):\n0 -> 0.000\n7 -> 12.000\n9 -> 0.333");
}

#[test]
fn sidecar_round_trip() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let video = temporary_directory.path().join("weekly sync.mp4");
    let output_dir = temporary_directory.path().join("maps").join("nested");

    let path = frame_map_path(&video, Some(&output_dir));
    assert_eq!(path, output_dir.join("weekly sync_frame_map.txt"));

    let mapping = build_frame_time_mapping(&[bundle(&[(0, 0.0), (5, 0.5)])]);
    write_frame_map(&path, &mapping).expect("Failed to write frame map");

    let written = std::fs::read_to_string(&path).expect("Failed to read frame map");
    assert_eq!(written, format!("{mapping}\n"));
}

#[test]
fn sidecar_defaults_to_video_directory() {
    let path = frame_map_path(Path::new("/data/in/call.webm"), None);
    assert_eq!(path, Path::new("/data/in/call_frame_map.txt"));
}
