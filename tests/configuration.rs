//! Configuration and value-object validation tests.

use sharecrop::{
    DEFAULT_BUNDLE_MAX_FRAMES, DEFAULT_BUNDLE_MAX_TIME_GAP_SEC, DEFAULT_ROI_DETECTION_DURATION_SEC,
    DEFAULT_SSIM_THRESHOLD, DEFAULT_TARGET_FPS, FrameBundle, PreprocessConfig, RoiMetadata,
    ValidationError,
};

#[test]
fn defaults_match_the_documented_values() {
    let config = PreprocessConfig::default();
    assert_eq!(config.target_fps(), 6.0);
    assert_eq!(config.roi_detection_duration_sec(), 10.0);
    assert_eq!(config.ssim_threshold(), 0.005);
    assert_eq!(config.bundle_max_frames(), 6);
    assert_eq!(config.bundle_max_time_gap_sec(), 2.0);

    assert_eq!(config.target_fps(), DEFAULT_TARGET_FPS);
    assert_eq!(config.roi_detection_duration_sec(), DEFAULT_ROI_DETECTION_DURATION_SEC);
    assert_eq!(config.ssim_threshold(), DEFAULT_SSIM_THRESHOLD);
    assert_eq!(config.bundle_max_frames(), DEFAULT_BUNDLE_MAX_FRAMES);
    assert_eq!(config.bundle_max_time_gap_sec(), DEFAULT_BUNDLE_MAX_TIME_GAP_SEC);
}

#[test]
fn builder_overrides_only_what_it_is_given() {
    let config = PreprocessConfig::builder()
        .with_target_fps(2.0)
        .with_bundle_max_time_gap_sec(0.0)
        .build()
        .expect("valid config");

    assert_eq!(config.target_fps(), 2.0);
    assert_eq!(config.bundle_max_time_gap_sec(), 0.0);
    assert_eq!(config.ssim_threshold(), DEFAULT_SSIM_THRESHOLD);
}

#[test]
fn non_positive_knobs_are_rejected() {
    assert!(matches!(
        PreprocessConfig::new(0.0, 10.0, 0.005, 6, 2.0),
        Err(ValidationError::NonPositive { field: "target_fps", .. })
    ));
    assert!(matches!(
        PreprocessConfig::new(6.0, -1.0, 0.005, 6, 2.0),
        Err(ValidationError::NonPositive { .. })
    ));
    assert!(matches!(
        PreprocessConfig::new(6.0, 10.0, 0.0, 6, 2.0),
        Err(ValidationError::NonPositive { .. })
    ));
    assert!(matches!(
        PreprocessConfig::new(6.0, 10.0, 0.005, 0, 2.0),
        Err(ValidationError::NonPositive { .. })
    ));
    assert!(matches!(
        PreprocessConfig::new(6.0, 10.0, 0.005, 6, -0.5),
        Err(ValidationError::Negative { .. })
    ));
}

#[test]
fn nan_is_rejected_everywhere() {
    assert!(PreprocessConfig::new(f64::NAN, 10.0, 0.005, 6, 2.0).is_err());
    assert!(PreprocessConfig::new(6.0, 10.0, 0.005, 6, f64::NAN).is_err());
    assert!(RoiMetadata::new(0, 0, 1, 1, f64::NAN).is_err());
}

#[test]
fn validation_messages_name_the_field() {
    let error = PreprocessConfig::builder()
        .with_ssim_threshold(-1.0)
        .build()
        .unwrap_err();
    assert!(error.to_string().contains("ssim_threshold"), "{error}");
}

#[test]
fn roi_bounds() {
    assert!(RoiMetadata::new(0, 0, 0, 10, 0.5).is_err());
    assert!(RoiMetadata::new(0, 0, 10, 0, 0.5).is_err());
    assert!(RoiMetadata::new(0, 0, 10, 10, 1.5).is_err());
    assert!(RoiMetadata::new(0, 0, 10, 10, -0.1).is_err());

    let edge = RoiMetadata::new(-5, 3, 10, 10, 0.0).expect("valid ROI");
    assert_eq!((edge.x(), edge.y()), (-5, 3));
    assert!(RoiMetadata::new(0, 0, 10, 10, 1.0).is_ok());
}

#[test]
fn bundle_sequences_must_agree() {
    let roi = RoiMetadata::new(0, 0, 4, 4, 1.0).unwrap();
    let frame = || image::DynamicImage::new_rgb8(4, 4);

    assert!(matches!(
        FrameBundle::new(vec![frame(), frame()], vec![0], vec![0.0, 0.1], roi),
        Err(ValidationError::BundleLengthMismatch { frames: 2, indices: 1, timestamps: 2 })
    ));
    assert_eq!(
        FrameBundle::new(Vec::new(), Vec::new(), Vec::new(), roi).unwrap_err(),
        ValidationError::EmptyBundle
    );

    let bundle = FrameBundle::new(vec![frame(), frame()], vec![0, 5], vec![0.0, 0.5], roi)
        .expect("valid bundle");
    assert_eq!(bundle.len(), 2);
    assert_eq!(bundle.duration_sec(), 0.5);
}
