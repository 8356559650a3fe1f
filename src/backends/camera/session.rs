// SPDX-License-Identifier: MPL-2.0

//! Camera session lifecycle
//!
//! [`CameraSessionController`] owns the single live binding. Every rebind
//! tears the previous binding down completely before the provider is asked for
//! a new one, so two bindings never coexist, even for the same facing.

use super::bridge::{self, Abandoned};
use super::{
    BackendResult, BindRequest, BindingId, CameraFacing, CameraProvider, CaptureConfig, CaptureUnit,
    PreviewConfig, PreviewSurface, ProviderSource, VideoConfig, VideoUnit,
};
use crate::config::Config;
use crate::constants::{capture, timing};
use crate::errors::CameraError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Unit descriptors applied on every bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub preview_fps: u32,
    pub jpeg_quality: u8,
    /// Bind a video unit alongside preview and capture
    pub video: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            preview_fps: capture::DEFAULT_PREVIEW_FPS,
            jpeg_quality: capture::DEFAULT_JPEG_QUALITY,
            video: true,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            preview_fps: config.preview_fps,
            jpeg_quality: config.jpeg_quality,
            video: true,
        }
    }
}

/// The active binding: its units and the token that dies with it
#[derive(Clone)]
pub struct SessionBinding {
    pub id: BindingId,
    pub facing: CameraFacing,
    pub capture: Arc<dyn CaptureUnit>,
    pub video: Option<Arc<dyn VideoUnit>>,
    provider: Arc<dyn CameraProvider>,
    token: CancellationToken,
}

impl SessionBinding {
    /// Cancelled when this binding is torn down
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl std::fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinding")
            .field("id", &self.id)
            .field("facing", &self.facing)
            .field("video", &self.video.is_some())
            .finish()
    }
}

pub struct CameraSessionController {
    source: Arc<dyn ProviderSource>,
    surface: Arc<dyn PreviewSurface>,
    settings: SessionSettings,
    binding: Option<SessionBinding>,
    facing: CameraFacing,
    next_id: u64,
    acquire_timeout: Duration,
    shutdown: CancellationToken,
}

impl CameraSessionController {
    pub fn new(
        source: Arc<dyn ProviderSource>,
        surface: Arc<dyn PreviewSurface>,
        settings: SessionSettings,
        facing: CameraFacing,
    ) -> Self {
        Self {
            source,
            surface,
            settings,
            binding: None,
            facing,
            next_id: 0,
            acquire_timeout: timing::PROVIDER_ACQUIRE_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Facing of the last rebind (or the initial facing)
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn binding(&self) -> Option<&SessionBinding> {
        self.binding.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Controller-lifetime token; child tokens are handed to bindings
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Tear down the current binding and bind fresh units for `facing`.
    ///
    /// On failure nothing is left bound and the preview surface is blank.
    pub async fn rebind(&mut self, facing: CameraFacing) -> Result<&SessionBinding, CameraError> {
        self.unbind();
        self.facing = facing;

        if self.shutdown.is_cancelled() {
            return Err(CameraError::Cancelled);
        }

        let provider = self.acquire_provider().await?;

        self.next_id += 1;
        let id = BindingId(self.next_id);
        let request = BindRequest {
            id,
            facing,
            preview: PreviewConfig {
                fps: self.settings.preview_fps,
            },
            capture: CaptureConfig {
                jpeg_quality: self.settings.jpeg_quality,
            },
            video: self.settings.video.then(VideoConfig::default),
        };

        debug!(binding = %id, facing = %facing, "Binding camera units");
        let session = match provider.bind(request) {
            Ok(session) => session,
            Err(e) => {
                warn!(binding = %id, facing = %facing, error = %e, "Camera binding failed");
                provider.unbind_all();
                self.surface.attach(None);
                return Err(CameraError::BindingFailed(e.to_string()));
            }
        };

        self.surface.attach(Some(session.preview));
        info!(binding = %id, facing = %facing, video = session.video.is_some(), "Camera bound");

        Ok(&*self.binding.insert(SessionBinding {
            id,
            facing,
            capture: session.capture,
            video: session.video,
            provider,
            token: self.shutdown.child_token(),
        }))
    }

    /// Release the active binding and blank the preview. No-op when unbound.
    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.token.cancel();
            binding.provider.unbind_all();
            self.surface.attach(None);
            info!(binding = %binding.id, facing = %binding.facing, "Camera unbound");
        }
    }

    /// Unbind and abandon everything still waiting on this controller
    pub fn shutdown(&mut self) {
        self.unbind();
        self.shutdown.cancel();
    }

    async fn acquire_provider(&self) -> Result<Arc<dyn CameraProvider>, CameraError> {
        let (resolver, pending) = bridge::bridge("camera provider");
        self.source.get_instance(Box::new(move |result: BackendResult<Arc<dyn CameraProvider>>| {
            resolver.resolve(result);
        }));

        match tokio::time::timeout(self.acquire_timeout, pending.wait(&self.shutdown)).await {
            Ok(Ok(Ok(provider))) => Ok(provider),
            Ok(Ok(Err(e))) => Err(CameraError::ProviderUnavailable(e.to_string())),
            Ok(Err(Abandoned::Cancelled)) => Err(CameraError::Cancelled),
            Ok(Err(Abandoned::Dropped)) => Err(CameraError::ProviderUnavailable(
                "provider callback was dropped".to_string(),
            )),
            Err(_) => Err(CameraError::ProviderUnavailable(format!(
                "no provider after {:?}",
                self.acquire_timeout
            ))),
        }
    }
}

impl std::fmt::Debug for CameraSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionController")
            .field("facing", &self.facing)
            .field("binding", &self.binding)
            .finish()
    }
}
