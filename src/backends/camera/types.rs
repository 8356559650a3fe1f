// SPDX-License-Identifier: MPL-2.0
// Shared types for camera backend abstraction

//! Shared types for camera backends

use super::{CaptureUnit, VideoUnit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    /// Rear camera
    #[default]
    Back,
    /// Selfie camera
    Front,
}

impl CameraFacing {
    /// Both facings, back first
    pub const ALL: [CameraFacing; 2] = [CameraFacing::Back, CameraFacing::Front];

    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// Identifies one bind/unbind cycle. Never reused within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Preview unit descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub fps: u32,
}

/// Still capture unit descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub jpeg_quality: u8,
}

/// Recorder quality selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoQuality {
    /// Best quality the device supports
    #[default]
    Highest,
    /// Lowest quality the device supports
    Lowest,
}

/// Video unit descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoConfig {
    pub quality: VideoQuality,
}

/// Everything the provider needs to bind one session
///
/// Descriptors are built fresh for every bind, so the units the provider
/// creates from them never outlive the binding they were made for.
#[derive(Debug, Clone)]
pub struct BindRequest {
    pub id: BindingId,
    pub facing: CameraFacing,
    pub preview: PreviewConfig,
    pub capture: CaptureConfig,
    pub video: Option<VideoConfig>,
}

/// Units produced by a successful bind
pub struct BoundSession {
    pub id: BindingId,
    pub facing: CameraFacing,
    /// Preview output, to be attached to the display surface
    pub preview: PreviewStream,
    pub capture: Arc<dyn CaptureUnit>,
    pub video: Option<Arc<dyn VideoUnit>>,
}

impl std::fmt::Debug for BoundSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundSession")
            .field("id", &self.id)
            .field("facing", &self.facing)
            .field("video", &self.video.is_some())
            .finish()
    }
}

/// A single preview frame (RGBA)
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub binding: BindingId,
    /// Per-binding frame counter, starting at 0
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

/// Receiver of preview frames
pub type FrameReceiver = futures::channel::mpsc::Receiver<PreviewFrame>;

/// Sender of preview frames
pub type FrameSender = futures::channel::mpsc::Sender<PreviewFrame>;

/// Preview output of one binding. The stream ends when the binding is torn down.
#[derive(Debug)]
pub struct PreviewStream {
    pub binding: BindingId,
    pub facing: CameraFacing,
    pub frames: FrameReceiver,
}

/// An encoded still image handed back by a capture unit
#[derive(Clone)]
pub struct CapturedImage {
    /// JPEG bytes
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub facing: CameraFacing,
    pub captured_at: Instant,
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("facing", &self.facing)
            .finish()
    }
}

/// Container a video unit writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoContainer {
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// Parameters of one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    pub output: PathBuf,
    pub with_audio: bool,
    pub torch: bool,
}

/// Lifecycle events emitted by a recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    /// Recorder is writing
    Started,
    /// Terminal event: the output file on success, the failure otherwise
    Finalized(Result<PathBuf, BackendError>),
}

/// Backend operation result
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by camera backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Camera provider is not available on this system
    NotAvailable(String),
    /// No camera with the requested facing
    DeviceNotFound(String),
    /// Camera is in use
    DeviceBusy(String),
    /// Units could not be bound together
    BindFailed(String),
    /// Still capture failed
    CaptureFailed(String),
    /// Recorder failed
    RecordingFailed(String),
    /// Unit was used after its binding was torn down
    Unbound,
    /// General I/O error
    IoError(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::BindFailed(msg) => write!(f, "Bind failed: {}", msg),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::RecordingFailed(msg) => write!(f, "Recording failed: {}", msg),
            BackendError::Unbound => write!(f, "Unit is no longer bound"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
