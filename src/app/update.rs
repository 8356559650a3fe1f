// SPDX-License-Identifier: MPL-2.0

//! Message update handling
//!
//! `update()` routes each message to a handler in `handlers`:
//!
//! - `handlers::system`: permissions, resume, shutdown
//! - `handlers::camera`: camera switching, torch, rebinding
//! - `handlers::capture`: photos, recording, scanning

use crate::app::state::{AppModel, Message};
use tracing::debug;

impl AppModel {
    /// Apply one message
    pub async fn update(&mut self, message: Message) {
        if self.shut_down {
            debug!(?message, "Ignoring message after shutdown");
            return;
        }

        match message {
            // ===== System =====
            Message::GrantPermissionPressed => self.handle_grant_permission().await,
            Message::Resumed => self.handle_resumed().await,
            Message::Shutdown => self.handle_shutdown(),

            // ===== Camera =====
            Message::SwitchCamera => self.handle_switch_camera().await,
            Message::ToggleTorch => self.handle_toggle_torch(),

            // ===== Capture =====
            Message::CapturePhoto => self.handle_capture_photo(),
            Message::PhotoCaptured(result) => self.handle_photo_captured(result).await,
            Message::ToggleRecording => self.handle_toggle_recording().await,
            Message::RecordingEvent(id, event) => self.handle_recording_event(id, event).await,

            // ===== Scan =====
            Message::ScanPressed => self.handle_scan_pressed(),
            Message::ScanCaptured(id, result) => self.handle_scan_captured(id, result).await,
            Message::ScanDecoded(id, result) => self.handle_scan_decoded(id, result),
            Message::OpenLink => self.handle_open_link(),
            Message::DismissScan => self.scan.dismiss(),
        }
    }
}
