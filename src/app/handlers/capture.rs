// SPDX-License-Identifier: MPL-2.0

//! Photo, recording and scan handlers
//!
//! Captures run on spawned tasks and report back through `Message`s. The
//! capture slot is claimed before the task is spawned, so a second request
//! arriving in the meantime is refused.

use crate::app::state::{AppModel, Message, Notice};
use crate::backends::camera::{CapturedImage, RecordEvent};
use crate::backends::decoder::Barcode;
use crate::errors::{AppError, CaptureError, RecordingError, ScanError};
use crate::flash::FlashMode;
use crate::storage::MediaRef;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl AppModel {
    // =========================================================================
    // Photo Capture Handlers
    // =========================================================================

    pub(crate) fn handle_capture_photo(&mut self) {
        let Some(binding) = self.session.binding() else {
            self.notify_error(CaptureError::NoBinding);
            return;
        };
        let unit = Arc::clone(&binding.capture);
        let cancel = binding.token().child_token();

        let ticket = match self.capture.begin() {
            Ok(ticket) => ticket,
            Err(CaptureError::Busy) => {
                debug!("Photo ignored, capture already in flight");
                return;
            }
            Err(e) => {
                self.notify_error(e);
                return;
            }
        };

        let flash = FlashMode::for_capture(self.torch, self.recording.active_torch());
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = ticket.capture_photo(unit, flash, cancel).await;
            Self::post(&sender, Message::PhotoCaptured(result));
        });
    }

    pub(crate) async fn handle_photo_captured(&mut self, result: Result<MediaRef, CaptureError>) {
        match result {
            Ok(saved) => {
                info!(uri = %saved.uri, "Photo captured");
                self.notify(Notice::Shutter);
                self.notify(Notice::PhotoSaved(saved));
            }
            Err(CaptureError::Cancelled) => debug!("Photo capture cancelled"),
            Err(e) => self.notify_error(AppError::from(e)),
        }
        self.apply_pending_facing().await;
    }

    // =========================================================================
    // Recording Handlers
    // =========================================================================

    pub(crate) async fn handle_toggle_recording(&mut self) {
        if self.recording.is_recording() {
            if let Some(output) = self.recording.stop() {
                info!(output = %output.display(), "Recording stop requested");
            }
            return;
        }

        let Some(binding) = self.session.binding() else {
            self.notify_error(CaptureError::NoBinding);
            return;
        };
        let Some(unit) = binding.video.clone() else {
            self.notify_error(RecordingError::NoVideoUnit);
            return;
        };

        let prompt = Arc::clone(&self.prompt);
        let audio = self.permissions.refresh_audio(prompt.as_ref());
        let torch = self.torch.is_enabled();
        let sender = self.sender.clone();

        let started = self
            .recording
            .start(unit.as_ref(), torch, audio, move |id, event| {
                Self::post(&sender, Message::RecordingEvent(id, event));
            })
            .await;

        if let Err(e) = started {
            self.notify_error(AppError::from(e));
        }
    }

    pub(crate) async fn handle_recording_event(&mut self, id: Uuid, event: RecordEvent) {
        match self.recording.on_event(id, event) {
            Some(Ok(path)) => self.notify(Notice::VideoSaved(path)),
            Some(Err(e)) => self.notify_error(AppError::from(e)),
            None => return,
        }
        self.apply_pending_facing().await;
    }

    // =========================================================================
    // Scan Handlers
    // =========================================================================

    pub(crate) fn handle_scan_pressed(&mut self) {
        if self.pending_scan.is_some() {
            debug!("Scan already in progress");
            return;
        }
        let Some(binding) = self.session.binding() else {
            self.notify_error(CaptureError::NoBinding);
            return;
        };
        let unit = Arc::clone(&binding.capture);
        let cancel = binding.token().child_token();

        let ticket = match self.capture.begin() {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!(error = %e, "Scan capture refused");
                return;
            }
        };

        let id = Uuid::new_v4();
        self.pending_scan = Some(id);
        let flash = FlashMode::for_capture(self.torch, self.recording.active_torch());
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = ticket.capture_for_scan(unit, flash, cancel).await;
            Self::post(&sender, Message::ScanCaptured(id, result));
        });
    }

    pub(crate) async fn handle_scan_captured(
        &mut self,
        id: Uuid,
        result: Result<CapturedImage, CaptureError>,
    ) {
        if self.pending_scan == Some(id) {
            match result {
                Ok(image) => {
                    let decoder = Arc::clone(&self.decoder);
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        let decoded = decoder.decode(&image).await;
                        Self::post(&sender, Message::ScanDecoded(id, decoded));
                    });
                }
                Err(CaptureError::Cancelled) => {
                    self.pending_scan = None;
                    debug!("Scan capture cancelled");
                }
                Err(e) => {
                    self.pending_scan = None;
                    self.notify_error(AppError::from(e));
                }
            }
        } else {
            debug!(scan = %id, "Dropping capture of an abandoned scan");
        }
        self.apply_pending_facing().await;
    }

    pub(crate) fn handle_scan_decoded(&mut self, id: Uuid, result: Result<Vec<Barcode>, ScanError>) {
        if self.pending_scan != Some(id) {
            debug!(scan = %id, "Scan result arrived after the scan was abandoned");
            return;
        }
        self.pending_scan = None;

        match result {
            Ok(barcodes) => {
                if self.scan.on_decoded(barcodes).is_none() {
                    info!("No code found in scan");
                }
            }
            Err(e) => warn!(error = %e, "Barcode decoding failed"),
        }
    }

    pub(crate) fn handle_open_link(&mut self) {
        let launcher = Arc::clone(&self.launcher);
        match self.scan.open_link(launcher.as_ref()) {
            Ok(url) => info!(url = %url, "Scanned link opened"),
            Err(e) => self.notify_error(AppError::from(e)),
        }
    }
}
