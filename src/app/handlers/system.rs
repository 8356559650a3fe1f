// SPDX-License-Identifier: MPL-2.0

//! Permission and lifecycle handlers

use crate::app::state::AppModel;
use crate::constants::REQUESTED_PERMISSIONS;
use crate::permissions::PermissionState;
use tracing::{debug, info, warn};

impl AppModel {
    // =========================================================================
    // Permission Handlers
    // =========================================================================

    pub(crate) async fn handle_grant_permission(&mut self) {
        if self.permissions.is_granted() {
            debug!("Permissions already granted");
            return;
        }

        let prompt = std::sync::Arc::clone(&self.prompt);
        let state = self
            .permissions
            .request_permissions(prompt.as_ref(), &REQUESTED_PERMISSIONS)
            .await;

        match state {
            PermissionState::Granted => {
                let facing = self.pending_facing.unwrap_or(self.session.facing());
                if self.is_settled() {
                    self.pending_facing = None;
                    self.bind_camera(facing).await;
                } else {
                    // A recording stopped by revocation may still be finalizing
                    info!(facing = %facing, "Camera busy, deferring bind");
                    self.pending_facing = Some(facing);
                }
            }
            _ => info!("Camera permission refused, staying on the grant screen"),
        }
    }

    // =========================================================================
    // Lifecycle Handlers
    // =========================================================================

    pub(crate) async fn handle_resumed(&mut self) {
        if !self.config.revalidate_on_resume {
            return;
        }

        let prompt = std::sync::Arc::clone(&self.prompt);
        if self.permissions.revalidate(prompt.as_ref()) {
            self.revoke_camera();
            return;
        }

        // Recover from a failed bind once the camera is free again
        if self.permissions.is_granted() && !self.session.is_bound() && self.is_settled() {
            let facing = self.pending_facing.take().unwrap_or(self.session.facing());
            info!(facing = %facing, "Rebinding camera after resume");
            self.bind_camera(facing).await;
        }
    }

    /// Camera permission was withdrawn while the screen was away
    fn revoke_camera(&mut self) {
        warn!("Camera permission revoked, releasing the camera");
        if self.recording.stop().is_some() {
            debug!("Recording stopped because of revocation");
        }
        self.session.unbind();
        self.scan.dismiss();
        self.pending_scan = None;
        self.pending_facing = None;
    }

    pub(crate) fn handle_shutdown(&mut self) {
        info!("Shutting down camera screen");
        self.recording.stop();
        self.session.shutdown();
        self.scan.dismiss();
        self.pending_scan = None;
        self.pending_facing = None;
        self.shut_down = true;
    }
}
