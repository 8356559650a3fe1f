// SPDX-License-Identifier: MPL-2.0

//! The camera screen
//!
//! # Architecture
//!
//! - `state`: [`AppModel`], [`Message`] and [`Notice`]
//! - `update`: message dispatch
//! - `handlers`: message handlers by domain (camera, capture, system)
//! - `view`: [`ScreenView`], the state a renderer draws
//! - `scan_result`: the scan dialog
//!
//! The model has a single owner. Work that completes later (captures,
//! decoding, recorder events) runs on spawned tasks that post a [`Message`]
//! back into the loop; provider acquisition and the permission dialog are
//! awaited inside `update`.

mod handlers;
pub mod scan_result;
mod state;
mod update;
mod view;

pub use scan_result::{ScanKind, ScanResult, ScanResultPresenter};
pub use state::{AppModel, Message, MessageReceiver, MessageSender, Notice};
pub use view::{CameraView, ScreenView};

use crate::backends::camera::{
    CameraSessionController, PreviewSurface, ProviderSource, SessionSettings,
};
use crate::backends::decoder::BarcodeDecoder;
use crate::backends::launcher::UrlLauncher;
use crate::config::Config;
use crate::flash::TorchState;
use crate::permissions::{PermissionGate, PermissionPrompt};
use crate::pipelines::{CaptureCoordinator, RecordingController};
use crate::storage::MediaStorage;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// External collaborators of the screen
#[derive(Clone)]
pub struct Backends {
    pub prompt: Arc<dyn PermissionPrompt>,
    pub provider: Arc<dyn ProviderSource>,
    pub surface: Arc<dyn PreviewSurface>,
    pub storage: Arc<dyn MediaStorage>,
    pub decoder: Arc<dyn BarcodeDecoder>,
    pub launcher: Arc<dyn UrlLauncher>,
}

impl AppModel {
    /// Create the screen and the receiver its callbacks post into
    pub fn new(config: Config, backends: Backends) -> (Self, MessageReceiver) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();

        let session = CameraSessionController::new(
            backends.provider,
            backends.surface,
            SessionSettings::from_config(&config),
            config.default_facing,
        );
        let capture = CaptureCoordinator::new(
            Arc::clone(&backends.storage),
            config.photo_relative_path.clone(),
        );
        let recording =
            RecordingController::new(backends.storage, config.video_relative_path.clone());

        let model = Self {
            prompt: backends.prompt,
            decoder: backends.decoder,
            launcher: backends.launcher,
            permissions: PermissionGate::new(),
            session,
            capture,
            recording,
            scan: ScanResultPresenter::new(),
            torch: TorchState::default(),
            pending_facing: None,
            pending_scan: None,
            shut_down: false,
            notices: VecDeque::new(),
            sender,
            config,
        };

        (model, receiver)
    }

    /// Sender for injecting messages from outside (UI, signal handlers)
    pub fn sender(&self) -> MessageSender {
        self.sender.clone()
    }

    /// Drain the pending notices, oldest first
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Pending notices without draining them
    pub fn pending_notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// No capture in flight, not recording, no finalize outstanding
    pub fn is_settled(&self) -> bool {
        !self.capture.is_busy() && self.recording.is_settled()
    }

    /// Process messages until `done` holds or `timeout` expires.
    ///
    /// `done` is checked before every message. Returns whether it held.
    pub async fn pump_until(
        &mut self,
        receiver: &mut MessageReceiver,
        timeout: Duration,
        mut done: impl FnMut(&Self) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if done(self) {
                return true;
            }
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Ok(Some(message)) => self.update(message).await,
                Ok(None) => return done(self),
                Err(_) => {
                    debug!(?timeout, "Gave up waiting for the screen");
                    return done(self);
                }
            }
        }
    }

    /// Run the message loop until [`Message::Shutdown`]
    pub async fn run(mut self, mut receiver: MessageReceiver) {
        info!("Camera screen started");
        while let Some(message) = receiver.recv().await {
            self.update(message).await;
            if self.shut_down {
                break;
            }
        }
        info!("Camera screen stopped");
    }
}
