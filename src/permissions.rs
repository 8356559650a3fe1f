// SPDX-License-Identifier: MPL-2.0

//! Capture permissions
//!
//! The camera permission is mandatory; microphone access is optional and only
//! decides whether recordings carry audio.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Permissions the app asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
            Permission::RecordAudio => write!(f, "microphone"),
        }
    }
}

/// Grant result per permission
pub type GrantMap = HashMap<Permission, bool>;

/// Whether the camera screen may be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Not asked yet
    #[default]
    Unknown,
    Denied,
    Granted,
}

/// The platform permission dialog
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    /// Ask the user; resolves once per call
    async fn request(&self, permissions: &[Permission]) -> GrantMap;

    /// Current grant status, without asking
    fn check(&self, permission: Permission) -> bool;
}

/// Tracks the permission state of the screen
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    state: PermissionState,
    audio_granted: bool,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    pub fn is_granted(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Latest known microphone grant
    pub fn audio_granted(&self) -> bool {
        self.audio_granted
    }

    /// Camera granted; microphone is optional
    pub fn is_satisfied(grants: &GrantMap) -> bool {
        grants.get(&Permission::Camera).copied().unwrap_or(false)
    }

    /// Apply a prompt result and return the new state
    pub fn apply(&mut self, grants: &GrantMap) -> PermissionState {
        self.audio_granted = grants.get(&Permission::RecordAudio).copied().unwrap_or(false);
        self.state = if Self::is_satisfied(grants) {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };

        info!(state = ?self.state, audio = self.audio_granted, "Permission result applied");
        self.state
    }

    /// Ask for every permission in `permissions` and apply the answer
    pub async fn request_permissions(
        &mut self,
        prompt: &dyn PermissionPrompt,
        permissions: &[Permission],
    ) -> PermissionState {
        debug!(?permissions, "Requesting permissions");
        let grants = prompt.request(permissions).await;
        self.apply(&grants)
    }

    /// Re-read the microphone grant without asking
    pub fn refresh_audio(&mut self, prompt: &dyn PermissionPrompt) -> bool {
        self.audio_granted = prompt.check(Permission::RecordAudio);
        self.audio_granted
    }

    /// Re-read the current OS grants. Returns true if the state changed.
    ///
    /// Only a previously granted camera can be revoked here; a denied screen
    /// stays denied until the user asks again.
    pub fn revalidate(&mut self, prompt: &dyn PermissionPrompt) -> bool {
        self.audio_granted = prompt.check(Permission::RecordAudio);

        if self.state == PermissionState::Granted && !prompt.check(Permission::Camera) {
            warn!("Camera permission was revoked");
            self.state = PermissionState::Denied;
            return true;
        }
        false
    }
}

/// Prompt with fixed answers that can be changed at runtime
#[derive(Debug, Clone, Default)]
pub struct StaticPrompt {
    grants: Arc<Mutex<GrantMap>>,
    requests: Arc<Mutex<u32>>,
}

impl StaticPrompt {
    pub fn new(grants: GrantMap) -> Self {
        Self {
            grants: Arc::new(Mutex::new(grants)),
            requests: Arc::default(),
        }
    }

    /// Every permission granted
    pub fn granting_all() -> Self {
        Self::new(GrantMap::from([
            (Permission::Camera, true),
            (Permission::RecordAudio, true),
        ]))
    }

    /// Every permission refused
    pub fn denying_all() -> Self {
        Self::new(GrantMap::from([
            (Permission::Camera, false),
            (Permission::RecordAudio, false),
        ]))
    }

    /// Change the answer for `permission`, e.g. to simulate a revocation in settings
    pub fn set(&self, permission: Permission, granted: bool) {
        self.grants
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(permission, granted);
    }

    /// Number of times the dialog was shown
    pub fn request_count(&self) -> u32 {
        *self.requests.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl PermissionPrompt for StaticPrompt {
    async fn request(&self, permissions: &[Permission]) -> GrantMap {
        *self.requests.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        let grants = self.grants.lock().unwrap_or_else(|p| p.into_inner());
        permissions
            .iter()
            .map(|p| (*p, grants.get(p).copied().unwrap_or(false)))
            .collect()
    }

    fn check(&self, permission: Permission) -> bool {
        self.grants
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&permission)
            .copied()
            .unwrap_or(false)
    }
}

/// Prompt for hosts without a permission system: everything is granted
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoGrantPrompt;

#[async_trait]
impl PermissionPrompt for AutoGrantPrompt {
    async fn request(&self, permissions: &[Permission]) -> GrantMap {
        permissions.iter().map(|p| (*p, true)).collect()
    }

    fn check(&self, _permission: Permission) -> bool {
        true
    }
}
