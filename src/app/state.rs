// SPDX-License-Identifier: MPL-2.0

//! Application state types

use crate::app::scan_result::ScanResultPresenter;
use crate::backends::camera::{CameraFacing, CameraSessionController, CapturedImage, RecordEvent};
use crate::backends::decoder::{Barcode, BarcodeDecoder};
use crate::backends::launcher::UrlLauncher;
use crate::config::Config;
use crate::errors::{CaptureError, ScanError};
use crate::flash::TorchState;
use crate::permissions::{PermissionGate, PermissionPrompt};
use crate::pipelines::{CaptureCoordinator, RecordingController};
use crate::storage::MediaRef;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Sending half of the message loop
pub type MessageSender = UnboundedSender<Message>;

/// Receiving half of the message loop
pub type MessageReceiver = UnboundedReceiver<Message>;

/// User input and callback results
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Permissions / lifecycle =====
    /// The grant-permission button was pressed
    GrantPermissionPressed,
    /// The screen became visible again
    Resumed,
    /// Tear everything down
    Shutdown,

    // ===== Camera =====
    /// Switch between front and back camera
    SwitchCamera,
    /// Flip the torch toggle
    ToggleTorch,

    // ===== Capture =====
    CapturePhoto,
    PhotoCaptured(Result<MediaRef, CaptureError>),
    ToggleRecording,
    RecordingEvent(Uuid, RecordEvent),

    // ===== Scan =====
    ScanPressed,
    ScanCaptured(Uuid, Result<CapturedImage, CaptureError>),
    ScanDecoded(Uuid, Result<Vec<Barcode>, ScanError>),
    OpenLink,
    DismissScan,
}

/// Transient user notice (toast, shutter sound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Play the shutter sound
    Shutter,
    PhotoSaved(MediaRef),
    VideoSaved(PathBuf),
    Error(String),
}

/// The camera screen
pub struct AppModel {
    pub config: Config,
    pub(crate) prompt: Arc<dyn PermissionPrompt>,
    pub(crate) decoder: Arc<dyn BarcodeDecoder>,
    pub(crate) launcher: Arc<dyn UrlLauncher>,
    pub(crate) permissions: PermissionGate,
    pub(crate) session: CameraSessionController,
    pub(crate) capture: CaptureCoordinator,
    pub(crate) recording: RecordingController,
    pub(crate) scan: ScanResultPresenter,
    pub(crate) torch: TorchState,
    /// Facing requested while the camera was busy, applied once it settles
    pub(crate) pending_facing: Option<CameraFacing>,
    /// Outstanding scan; results tagged with another id are stale
    pub(crate) pending_scan: Option<Uuid>,
    pub(crate) shut_down: bool,
    pub(crate) notices: VecDeque<Notice>,
    pub(crate) sender: MessageSender,
}

impl AppModel {
    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub(crate) fn notify_error(&mut self, error: impl std::fmt::Display) {
        self.notices.push_back(Notice::Error(error.to_string()));
    }

    /// Post a message back into the loop
    pub(crate) fn post(sender: &MessageSender, message: Message) {
        if sender.send(message).is_err() {
            tracing::debug!("Message loop closed, dropping message");
        }
    }
}

impl std::fmt::Debug for AppModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppModel")
            .field("permissions", &self.permissions)
            .field("session", &self.session)
            .field("recording", &self.recording)
            .field("pending_facing", &self.pending_facing)
            .field("pending_scan", &self.pending_scan)
            .finish()
    }
}
