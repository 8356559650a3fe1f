// SPDX-License-Identifier: MPL-2.0

//! Still capture
//!
//! ```text
//! begin() ──► CaptureTicket ──► take_picture ──► MediaStorage (photo)
//!                   │                        └─► CapturedImage (scan)
//!                   └── dropped: slot released
//! ```
//!
//! At most one capture is in flight. [`CaptureCoordinator::begin`] claims the
//! slot synchronously so a second request is refused before any camera work
//! starts; the slot is released when the ticket is dropped, however the
//! capture ended.

use crate::backends::camera::bridge;
use crate::backends::camera::{BackendError, BackendResult, CaptureUnit, CapturedImage};
use crate::errors::CaptureError;
use crate::flash::FlashMode;
use crate::storage::{MediaEntry, MediaRef, MediaStorage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CaptureCoordinator {
    in_flight: Arc<AtomicBool>,
    storage: Arc<dyn MediaStorage>,
    photo_relative_path: String,
}

impl CaptureCoordinator {
    pub fn new(storage: Arc<dyn MediaStorage>, photo_relative_path: impl Into<String>) -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            storage,
            photo_relative_path: photo_relative_path.into(),
        }
    }

    /// A capture is pending
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the in-flight slot
    pub fn begin(&self) -> Result<CaptureTicket, CaptureError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Capture requested while another is pending");
            return Err(CaptureError::Busy);
        }

        Ok(CaptureTicket {
            slot: Arc::clone(&self.in_flight),
            storage: Arc::clone(&self.storage),
            photo_relative_path: self.photo_relative_path.clone(),
        })
    }

    /// Claim the slot and capture a photo in one step
    pub async fn capture_photo(
        &self,
        unit: Arc<dyn CaptureUnit>,
        flash: FlashMode,
        cancel: CancellationToken,
    ) -> Result<MediaRef, CaptureError> {
        self.begin()?.capture_photo(unit, flash, cancel).await
    }
}

impl std::fmt::Debug for CaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCoordinator")
            .field("busy", &self.is_busy())
            .field("photo_relative_path", &self.photo_relative_path)
            .finish()
    }
}

/// Ownership of the in-flight slot
pub struct CaptureTicket {
    slot: Arc<AtomicBool>,
    storage: Arc<dyn MediaStorage>,
    photo_relative_path: String,
}

impl CaptureTicket {
    /// Take a still and save it as `Img_<millis>.jpg`
    pub async fn capture_photo(
        self,
        unit: Arc<dyn CaptureUnit>,
        flash: FlashMode,
        cancel: CancellationToken,
    ) -> Result<MediaRef, CaptureError> {
        let image = take_picture(unit.as_ref(), flash, &cancel).await?;

        let entry = MediaEntry::photo(&self.photo_relative_path);
        let saved = self.storage.save(&entry, image.data).await?;

        info!(path = %saved.path.display(), ?flash, "Photo saved");
        Ok(saved)
    }

    /// Take a still for the barcode scanner; nothing is saved
    pub async fn capture_for_scan(
        self,
        unit: Arc<dyn CaptureUnit>,
        flash: FlashMode,
        cancel: CancellationToken,
    ) -> Result<CapturedImage, CaptureError> {
        let image = take_picture(unit.as_ref(), flash, &cancel).await?;
        debug!(width = image.width, height = image.height, "Scan frame captured");
        Ok(image)
    }
}

impl Drop for CaptureTicket {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

async fn take_picture(
    unit: &dyn CaptureUnit,
    flash: FlashMode,
    cancel: &CancellationToken,
) -> Result<CapturedImage, CaptureError> {
    let (resolver, pending) = bridge::bridge("still capture");
    unit.take_picture(
        flash,
        Box::new(move |result: BackendResult<CapturedImage>| {
            resolver.resolve(result);
        }),
    );

    match pending.wait(cancel).await {
        Ok(Ok(image)) => Ok(image),
        Ok(Err(BackendError::Unbound)) | Err(_) => {
            debug!("Capture abandoned");
            Err(CaptureError::Cancelled)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Capture failed");
            Err(CaptureError::CaptureFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{
        BindRequest, BindingId, CameraFacing, CameraProvider, CaptureConfig, PreviewConfig,
        VirtualCamera,
    };
    use crate::storage::FsMediaStorage;

    fn setup() -> (VirtualCamera, Arc<dyn CaptureUnit>, CaptureCoordinator, FsMediaStorage) {
        let camera = VirtualCamera::default();
        let session = camera
            .bind(BindRequest {
                id: BindingId(1),
                facing: CameraFacing::Back,
                preview: PreviewConfig { fps: 30 },
                capture: CaptureConfig { jpeg_quality: 80 },
                video: None,
            })
            .unwrap();
        let storage = FsMediaStorage::new(
            std::env::temp_dir().join(format!("camapp-photo-{}", uuid::Uuid::new_v4())),
        );
        let coordinator = CaptureCoordinator::new(Arc::new(storage.clone()), "Pictures");
        (camera, session.capture, coordinator, storage)
    }

    #[tokio::test]
    async fn test_second_begin_is_busy() {
        let (_camera, _unit, coordinator, _storage) = setup();

        let ticket = coordinator.begin().unwrap();
        assert!(coordinator.is_busy());
        assert_eq!(coordinator.begin().err(), Some(CaptureError::Busy));

        drop(ticket);
        assert!(!coordinator.is_busy());
        assert!(coordinator.begin().is_ok());
    }

    #[tokio::test]
    async fn test_capture_photo_saves_jpeg() {
        let (camera, unit, coordinator, storage) = setup();

        let saved = coordinator
            .capture_photo(unit, FlashMode::On, CancellationToken::new())
            .await
            .unwrap();

        let name = saved.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Img_") && name.ends_with(".jpg"));
        assert_eq!(&std::fs::read(&saved.path).unwrap()[..2], &[0xFF, 0xD8]);
        assert_eq!(camera.stats().last_flash, Some(FlashMode::On));
        assert!(!coordinator.is_busy());

        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_unit() {
        let (camera, unit, coordinator, storage) = setup();
        camera.fail_next_captures(1);

        let first = coordinator
            .capture_photo(Arc::clone(&unit), FlashMode::Off, CancellationToken::new())
            .await;
        assert!(matches!(first, Err(CaptureError::CaptureFailed(_))));
        assert!(!coordinator.is_busy());

        let second = coordinator
            .capture_photo(unit, FlashMode::Off, CancellationToken::new())
            .await;
        assert!(second.is_ok());

        let _ = std::fs::remove_dir_all(storage.root());
    }

    #[tokio::test]
    async fn test_cancelled_capture_releases_slot() {
        let (camera, unit, coordinator, _storage) = setup();
        camera.set_capture_delay(std::time::Duration::from_secs(10));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = coordinator.capture_photo(unit, FlashMode::Off, cancel).await;

        assert_eq!(result.unwrap_err(), CaptureError::Cancelled);
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn test_capture_after_unbind_is_cancelled() {
        let (camera, unit, coordinator, _storage) = setup();
        camera.unbind_all();

        let ticket = coordinator.begin().unwrap();
        let result = ticket
            .capture_for_scan(unit, FlashMode::Off, CancellationToken::new())
            .await;
        assert_eq!(result.unwrap_err(), CaptureError::Cancelled);
    }
}
