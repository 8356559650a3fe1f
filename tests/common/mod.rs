// SPDX-License-Identifier: MPL-2.0

//! Shared fixture for screen-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use camapp::app::{CameraView, MessageReceiver};
use camapp::backends::camera::{HeadlessSurface, VirtualCamera};
use camapp::backends::decoder::{Barcode, BarcodeDecoder, Symbology};
use camapp::backends::launcher::UrlLauncher;
use camapp::backends::camera::CapturedImage;
use camapp::errors::ScanError;
use camapp::permissions::StaticPrompt;
use camapp::storage::FsMediaStorage;
use camapp::{AppModel, Backends, Config, Message, Notice, ScreenView};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

/// Decoder returning a scripted answer
#[derive(Default)]
pub struct ScriptedDecoder {
    answer: Mutex<Option<Result<Vec<Barcode>, ScanError>>>,
}

impl ScriptedDecoder {
    pub fn answer_text(&self, text: &str) {
        *self.answer.lock().unwrap() = Some(Ok(vec![Barcode {
            text: text.to_string(),
            symbology: Symbology::Qr,
        }]));
    }

    pub fn answer(&self, answer: Result<Vec<Barcode>, ScanError>) {
        *self.answer.lock().unwrap() = Some(answer);
    }
}

#[async_trait]
impl BarcodeDecoder for ScriptedDecoder {
    async fn decode(&self, _image: &CapturedImage) -> Result<Vec<Barcode>, ScanError> {
        self.answer.lock().unwrap().clone().unwrap_or(Ok(Vec::new()))
    }
}

/// Launcher that records what it was asked to open
#[derive(Default)]
pub struct RecordingLauncher {
    pub opened: Mutex<Vec<String>>,
}

impl UrlLauncher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), ScanError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub screen: AppModel,
    pub messages: MessageReceiver,
    pub camera: VirtualCamera,
    pub surface: Arc<HeadlessSurface>,
    pub prompt: StaticPrompt,
    pub decoder: Arc<ScriptedDecoder>,
    pub launcher: Arc<RecordingLauncher>,
    pub storage: FsMediaStorage,
}

impl Harness {
    pub fn new(prompt: StaticPrompt) -> Self {
        Self::with_config(prompt, Config::default())
    }

    pub fn with_config(prompt: StaticPrompt, mut config: Config) -> Self {
        let root = std::env::temp_dir().join(format!("camapp-screen-{}", uuid::Uuid::new_v4()));
        config.media_root = Some(root.clone());
        config.virtual_width = 64;
        config.virtual_height = 48;

        let camera = VirtualCamera::default();
        let surface = Arc::new(HeadlessSurface::new());
        let decoder = Arc::new(ScriptedDecoder::default());
        let launcher = Arc::new(RecordingLauncher::default());
        let storage = FsMediaStorage::new(root);

        let backends = Backends {
            prompt: Arc::new(prompt.clone()),
            provider: Arc::new(camera.clone()),
            surface: Arc::clone(&surface) as _,
            storage: Arc::new(storage.clone()),
            decoder: Arc::clone(&decoder) as _,
            launcher: Arc::clone(&launcher) as _,
        };
        let (screen, messages) = AppModel::new(config, backends);

        Self {
            screen,
            messages,
            camera,
            surface,
            prompt,
            decoder,
            launcher,
            storage,
        }
    }

    /// Permissions granted and the camera bound
    pub async fn ready() -> Self {
        let mut harness = Self::new(StaticPrompt::granting_all());
        harness.send(Message::GrantPermissionPressed).await;
        harness
    }

    pub async fn send(&mut self, message: Message) {
        self.screen.update(message).await;
    }

    /// Process callbacks until `done` holds
    pub async fn pump(&mut self, done: impl FnMut(&AppModel) -> bool) -> bool {
        self.screen.pump_until(&mut self.messages, WAIT, done).await
    }

    /// Process callbacks for `duration`
    pub async fn settle_for(&mut self, duration: Duration) {
        self.screen
            .pump_until(&mut self.messages, duration, |_| false)
            .await;
    }

    /// Wait for a notice matching `predicate`
    pub async fn wait_notice(&mut self, predicate: impl Fn(&Notice) -> bool) -> bool {
        self.pump(|screen| screen.pending_notices().any(&predicate)).await
    }

    pub fn camera_view(&self) -> CameraView {
        match self.screen.view() {
            ScreenView::Camera(view) => view,
            other => panic!("expected the camera view, got {:?}", other),
        }
    }

    /// Files in the photo directory
    pub fn photos(&self) -> Vec<PathBuf> {
        let dir = self.storage.root().join(&self.screen.config.photo_relative_path);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.flatten().map(|entry| entry.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.storage.root());
    }
}

pub fn count(notices: &[Notice], predicate: impl Fn(&Notice) -> bool) -> usize {
    notices.iter().filter(|notice| predicate(notice)).count()
}
