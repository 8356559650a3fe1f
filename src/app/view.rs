// SPDX-License-Identifier: MPL-2.0

//! What the screen shows
//!
//! The renderer draws a [`ScreenView`]; it never reads the model directly.

use crate::app::scan_result::ScanResult;
use crate::app::state::AppModel;
use crate::backends::camera::{BindingId, CameraFacing};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    /// Only the grant-permission button. `denied` after a refused request.
    PermissionRequired { denied: bool },
    Camera(CameraView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraView {
    pub facing: CameraFacing,
    /// Live binding feeding the preview; `None` while the preview is blank
    pub binding: Option<BindingId>,
    pub torch: bool,
    pub recording: bool,
    pub recording_elapsed: Duration,
    pub capture_busy: bool,
    pub scanning: bool,
    /// Facing that will be bound once the camera settles
    pub switch_pending: Option<CameraFacing>,
    /// Contents of the scan dialog
    pub scan_result: Option<ScanResult>,
}

impl AppModel {
    pub fn view(&self) -> ScreenView {
        if !self.permissions.is_granted() {
            return ScreenView::PermissionRequired {
                denied: self.permissions.state() == crate::permissions::PermissionState::Denied,
            };
        }

        ScreenView::Camera(CameraView {
            facing: self.session.facing(),
            binding: self.session.binding().map(|binding| binding.id),
            torch: self.torch.is_enabled(),
            recording: self.recording.is_recording(),
            recording_elapsed: self.recording.state().elapsed(),
            capture_busy: self.capture.is_busy(),
            scanning: self.pending_scan.is_some(),
            switch_pending: self.pending_facing,
            scan_result: self.scan.current().cloned(),
        })
    }
}
