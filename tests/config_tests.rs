// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camapp::{CameraFacing, Config};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(
        config.default_facing,
        CameraFacing::Back,
        "The back camera should open by default"
    );
    assert!(
        config.revalidate_on_resume,
        "Permissions should be re-checked on resume by default"
    );
}

#[test]
fn test_config_default_media_paths() {
    let config = Config::default();
    assert_eq!(config.photo_relative_path, "Pictures/CamApp Photos");
    assert_eq!(config.video_relative_path, "DCIM/Albums/CamApp Videos");
}

#[test]
fn test_config_media_root_override() {
    let config = Config {
        media_root: Some("/srv/media".into()),
        ..Config::default()
    };
    assert_eq!(config.media_root(), std::path::PathBuf::from("/srv/media"));
}

#[test]
fn test_config_path_is_app_specific() {
    if let Some(path) = Config::path() {
        assert!(path.ends_with("camapp/config.json"));
    }
}

#[test]
fn test_config_json_round_trip() {
    let config = Config {
        default_facing: CameraFacing::Front,
        jpeg_quality: 60,
        ..Config::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
