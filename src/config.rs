// SPDX-License-Identifier: MPL-2.0

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/camapp/config.json`. Missing fields fall
//! back to their defaults, so older files keep loading after new settings are
//! added.

use crate::backends::camera::CameraFacing;
use crate::constants::{capture, media};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "camapp";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera facing selected when the screen opens
    pub default_facing: CameraFacing,
    /// Root that relative media paths are resolved against (home dir if unset)
    pub media_root: Option<PathBuf>,
    /// Photo location relative to the media root
    pub photo_relative_path: String,
    /// Video location relative to the media root
    pub video_relative_path: String,
    /// JPEG quality for stills (1-100)
    pub jpeg_quality: u8,
    /// Preview frame rate requested from the camera
    pub preview_fps: u32,
    /// Still/video width of the virtual camera
    pub virtual_width: u32,
    /// Still/video height of the virtual camera
    pub virtual_height: u32,
    /// Re-check permissions every time the app resumes
    pub revalidate_on_resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_facing: CameraFacing::Back,
            media_root: None,
            photo_relative_path: media::PHOTO_RELATIVE_PATH.to_string(),
            video_relative_path: media::VIDEO_RELATIVE_PATH.to_string(),
            jpeg_quality: capture::DEFAULT_JPEG_QUALITY,
            preview_fps: capture::DEFAULT_PREVIEW_FPS,
            virtual_width: capture::DEFAULT_WIDTH,
            virtual_height: capture::DEFAULT_HEIGHT,
            revalidate_on_resume: true,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the user config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            warn!("No config directory on this system, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default config");
                Self::default()
            }
        }
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| AppError::Config(e.to_string()))?;
        config.validated()
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Media root, defaulting to the user's home directory
    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn validated(self) -> AppResult<Self> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.preview_fps == 0 {
            return Err(AppError::Config("preview_fps must be positive".into()));
        }
        if self.virtual_width == 0 || self.virtual_height == 0 {
            return Err(AppError::Config("virtual camera size must be positive".into()));
        }
        for relative in [&self.photo_relative_path, &self.video_relative_path] {
            if Path::new(relative).is_absolute() {
                return Err(AppError::Config(format!(
                    "media paths must be relative, got {}",
                    relative
                )));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("camapp-config-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_path("missing.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_path("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "default_facing": "Front", "jpeg_quality": 75 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_facing, CameraFacing::Front);
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.photo_relative_path, media::PHOTO_RELATIVE_PATH);
        assert!(config.revalidate_on_resume);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("nested/config.json");
        let config = Config {
            media_root: Some(PathBuf::from("/tmp/camapp-media")),
            preview_fps: 15,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let path = temp_path("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "jpeg_quality": 0 }"#).unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_absolute_media_path() {
        let path = temp_path("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "photo_relative_path": "/etc" }"#).unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }
}
