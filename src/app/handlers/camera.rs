// SPDX-License-Identifier: MPL-2.0

//! Camera selection and torch handlers
//!
//! A switch requested while a capture is in flight or a recording is running
//! (or still finalizing) is not applied right away. The latest requested
//! facing is remembered and bound once the camera settles.

use crate::app::state::AppModel;
use crate::backends::camera::CameraFacing;
use crate::errors::AppError;
use tracing::{debug, info};

impl AppModel {
    // =========================================================================
    // Camera Selection Handlers
    // =========================================================================

    pub(crate) async fn handle_switch_camera(&mut self) {
        if !self.permissions.is_granted() {
            debug!("Camera switch ignored without permission");
            return;
        }

        let requested = self
            .pending_facing
            .unwrap_or(self.session.facing())
            .toggled();

        if !self.is_settled() {
            info!(facing = %requested, "Camera busy, deferring switch");
            self.pending_facing = Some(requested);
            return;
        }

        self.pending_facing = None;
        self.bind_camera(requested).await;
    }

    /// Bind the facing requested while busy, if the camera has settled
    pub(crate) async fn apply_pending_facing(&mut self) {
        if !self.is_settled() || !self.permissions.is_granted() {
            return;
        }
        let Some(facing) = self.pending_facing.take() else {
            return;
        };

        if self.session.is_bound() && self.session.facing() == facing {
            debug!(facing = %facing, "Deferred switch cancelled out");
            return;
        }

        info!(facing = %facing, "Applying deferred camera switch");
        self.bind_camera(facing).await;
    }

    /// Rebind to `facing`, turning a failure into a notice
    pub(crate) async fn bind_camera(&mut self, facing: CameraFacing) {
        if let Err(e) = self.session.rebind(facing).await {
            self.notify_error(AppError::from(e));
        }
    }

    pub(crate) fn handle_toggle_torch(&mut self) {
        let enabled = self.torch.toggle();
        info!(enabled, "Torch toggled");
    }
}
