// SPDX-License-Identifier: MPL-2.0

//! Media storage
//!
//! Saved assets are described by a [`MediaEntry`] (display name, MIME type and
//! a path relative to the media root) and written by a [`MediaStorage`].

use crate::backends::camera::VideoContainer;
use crate::constants::media;
use crate::errors::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Description of an asset to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub display_name: String,
    pub mime_type: String,
    /// Directory relative to the media root, `/`-separated
    pub relative_path: String,
}

impl MediaEntry {
    /// `Img_<unix-millis>.jpg` stamped with the current time
    pub fn photo(relative_path: &str) -> Self {
        Self::photo_at(relative_path, Utc::now())
    }

    pub fn photo_at(relative_path: &str, at: DateTime<Utc>) -> Self {
        Self {
            display_name: format!(
                "{}{}.{}",
                media::PHOTO_PREFIX,
                at.timestamp_millis(),
                media::PHOTO_EXTENSION
            ),
            mime_type: media::PHOTO_MIME_TYPE.to_string(),
            relative_path: relative_path.to_string(),
        }
    }

    /// `VID_<unix-millis>.<ext>` for the recorder's container
    pub fn video(relative_path: &str, container: VideoContainer) -> Self {
        Self::video_at(relative_path, container, Utc::now())
    }

    pub fn video_at(relative_path: &str, container: VideoContainer, at: DateTime<Utc>) -> Self {
        Self {
            display_name: format!(
                "{}{}.{}",
                media::VIDEO_PREFIX,
                at.timestamp_millis(),
                container.extension
            ),
            mime_type: container.mime_type.to_string(),
            relative_path: relative_path.to_string(),
        }
    }
}

/// Location of a saved asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub uri: String,
    pub path: PathBuf,
}

impl MediaRef {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            uri: format!("file://{}", path.display()),
            path,
        }
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Persists captured media
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Write `data` as a new asset. Never overwrites an existing one.
    async fn save(&self, entry: &MediaEntry, data: Arc<[u8]>) -> Result<MediaRef, StorageError>;

    /// Reserve a new, empty output file for a writer that streams into it
    async fn allocate(&self, entry: &MediaEntry) -> Result<PathBuf, StorageError>;
}

/// Filesystem storage rooted at a media directory
#[derive(Debug, Clone)]
pub struct FsMediaStorage {
    root: PathBuf,
}

impl FsMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an entry's relative path resolves to
    pub fn directory(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative_path.is_empty() || escapes {
            return Err(StorageError::InvalidEntry(format!(
                "relative path {:?} leaves the media root",
                relative_path
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Most recent files in `relative_path`, newest first
    pub async fn recent(
        &self,
        relative_path: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let dir = self.directory(relative_path)?;
        tokio::task::spawn_blocking(move || {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::from(e)),
            };

            let mut files: Vec<_> = entries
                .flatten()
                .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
                .map(|entry| {
                    let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
                    (std::cmp::Reverse(modified), entry.path())
                })
                .collect();

            files.sort();
            Ok(files.into_iter().take(limit).map(|(_, path)| path).collect())
        })
        .await
        .map_err(|e| StorageError::Io(e.to_string()))?
    }

    /// Create a new file for `entry`, adding `_N` to the name if it is taken
    fn create_unique(&self, entry: &MediaEntry) -> Result<(PathBuf, std::fs::File), StorageError> {
        let name = Path::new(&entry.display_name);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(StorageError::InvalidEntry(format!(
                "display name {:?} is not a file name",
                entry.display_name
            )));
        }

        let dir = self.directory(&entry.relative_path)?;
        std::fs::create_dir_all(&dir)?;

        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

        for suffix in 0..=media::MAX_NAME_SUFFIX {
            let file_name = match (suffix, &extension) {
                (0, _) => entry.display_name.clone(),
                (n, Some(ext)) => format!("{}_{}.{}", stem, n, ext),
                (n, None) => format!("{}_{}", stem, n),
            };
            let path = dir.join(file_name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Name taken, trying next suffix");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Io(format!(
            "no free name for {} in {}",
            entry.display_name,
            dir.display()
        )))
    }
}

#[async_trait]
impl MediaStorage for FsMediaStorage {
    async fn save(&self, entry: &MediaEntry, data: Arc<[u8]>) -> Result<MediaRef, StorageError> {
        let storage = self.clone();
        let entry = entry.clone();
        let path = tokio::task::spawn_blocking(move || -> Result<PathBuf, StorageError> {
            let (path, mut file) = storage.create_unique(&entry)?;
            file.write_all(&data)?;
            file.sync_all()?;
            Ok(path)
        })
        .await
        .map_err(|e| StorageError::Io(e.to_string()))??;

        info!(path = %path.display(), "Media saved");
        Ok(MediaRef::from_path(path))
    }

    async fn allocate(&self, entry: &MediaEntry) -> Result<PathBuf, StorageError> {
        let storage = self.clone();
        let entry = entry.clone();
        let path = tokio::task::spawn_blocking(move || {
            storage.create_unique(&entry).map(|(path, _)| path)
        })
        .await
        .map_err(|e| StorageError::Io(e.to_string()))??;

        debug!(path = %path.display(), "Media output allocated");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_storage() -> FsMediaStorage {
        FsMediaStorage::new(std::env::temp_dir().join(format!("camapp-storage-{}", uuid::Uuid::new_v4())))
    }

    const MJPEG: VideoContainer = VideoContainer {
        extension: "mjpeg",
        mime_type: "video/x-motion-jpeg",
    };

    #[test]
    fn test_photo_entry_name() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let entry = MediaEntry::photo_at("Pictures/CamApp Photos", at);
        assert_eq!(entry.display_name, "Img_1700000000123.jpg");
        assert_eq!(entry.mime_type, "image/jpeg");
        assert_eq!(entry.relative_path, "Pictures/CamApp Photos");
    }

    #[test]
    fn test_video_entry_uses_container() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        let entry = MediaEntry::video_at("DCIM/Albums/CamApp Videos", MJPEG, at);
        assert_eq!(entry.display_name, "VID_42.mjpeg");
        assert_eq!(entry.mime_type, "video/x-motion-jpeg");
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let storage = temp_storage();
        assert!(storage.directory("../outside").is_err());
        assert!(storage.directory("/etc").is_err());
        assert!(storage.directory("").is_err());
        assert!(storage.directory("Pictures/CamApp Photos").is_ok());
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let storage = temp_storage();
        let entry = MediaEntry::photo_at("Pictures", Utc.timestamp_millis_opt(1).unwrap());

        let first = storage.save(&entry, Arc::from(&b"one"[..])).await.unwrap();
        let second = storage.save(&entry, Arc::from(&b"two"[..])).await.unwrap();

        assert_ne!(first.path, second.path);
        assert!(second.path.ends_with("Img_1_1.jpg"));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");
        assert_eq!(std::fs::read(&second.path).unwrap(), b"two");
        assert!(first.uri.starts_with("file://"));

        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn test_rejects_bad_display_name() {
        let storage = temp_storage();
        let entry = MediaEntry {
            display_name: "../evil.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            relative_path: "Pictures".to_string(),
        };
        let result = storage.save(&entry, Arc::from(&b"x"[..])).await;
        assert!(matches!(result, Err(StorageError::InvalidEntry(_))));
    }

    #[tokio::test]
    async fn test_allocate_and_recent() {
        let storage = temp_storage();
        let entry = MediaEntry::video_at("Videos", MJPEG, Utc.timestamp_millis_opt(7).unwrap());

        let path = storage.allocate(&entry).await.unwrap();
        assert!(path.exists());

        let recent = storage.recent("Videos", 10).await.unwrap();
        assert_eq!(recent, vec![path]);
        assert!(storage.recent("Missing", 10).await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(storage.root());
    }
}
