// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application
//!
//! Every error is handled where it happens and turned into a transient
//! [`Notice`](crate::app::Notice); none of them is allowed to leave a component
//! in an inconsistent state.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The mandatory camera permission was refused
    PermissionDenied,
    /// Camera session errors
    Camera(CameraError),
    /// Still capture errors
    Capture(CaptureError),
    /// Recording errors
    Recording(RecordingError),
    /// Scan result errors
    Scan(ScanError),
    /// Storage/filesystem errors
    Storage(StorageError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera provider could not bind the requested units
    BindingFailed(String),
    /// Camera provider could not be acquired
    ProviderUnavailable(String),
    /// Provider acquisition was abandoned before it resolved
    Cancelled,
}

/// Still capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Another still capture is already in flight
    Busy,
    /// No session is bound
    NoBinding,
    /// Capture was abandoned because the session went away
    Cancelled,
    /// Hardware error reported by the capture unit
    CaptureFailed(String),
    /// Captured image could not be written
    Storage(StorageError),
}

/// Recording errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Recording already in progress
    AlreadyRecording,
    /// The bound session has no video unit
    NoVideoUnit,
    /// Recorder refused to start
    StartFailed(String),
    /// Finalize reported an error
    FinalizeFailed(String),
    /// Output target could not be allocated
    Storage(StorageError),
}

/// Scan result errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No scan result is currently shown
    NoResult,
    /// The current result is not a link
    NotALink,
    /// Decoder could not process the image
    DecodeFailed(String),
    /// URL launcher failed
    LaunchFailed(String),
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Filesystem operation failed
    Io(String),
    /// Media entry describes an unusable location
    InvalidEntry(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::PermissionDenied => write!(f, "Camera permission denied"),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Scan(e) => write!(f, "Scan error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::BindingFailed(msg) => write!(f, "Binding failed: {}", msg),
            CameraError::ProviderUnavailable(msg) => {
                write!(f, "Camera provider unavailable: {}", msg)
            }
            CameraError::Cancelled => write!(f, "Camera provider acquisition cancelled"),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Busy => write!(f, "A capture is already in progress"),
            CaptureError::NoBinding => write!(f, "Camera is not ready"),
            CaptureError::Cancelled => write!(f, "Capture cancelled"),
            CaptureError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::Storage(e) => write!(f, "Save failed: {}", e),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::NoVideoUnit => write!(f, "Video recording is not available"),
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
            RecordingError::FinalizeFailed(msg) => write!(f, "Recording failed: {}", msg),
            RecordingError::Storage(e) => write!(f, "No output location: {}", e),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoResult => write!(f, "No scan result"),
            ScanError::NotALink => write!(f, "Scan result is not a link"),
            ScanError::DecodeFailed(msg) => write!(f, "Decode failed: {}", msg),
            ScanError::LaunchFailed(msg) => write!(f, "Could not open link: {}", msg),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "I/O error: {}", msg),
            StorageError::InvalidEntry(msg) => write!(f, "Invalid media entry: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for ScanError {}
impl std::error::Error for StorageError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<StorageError> for CaptureError {
    fn from(err: StorageError) -> Self {
        CaptureError::Storage(err)
    }
}

impl From<StorageError> for RecordingError {
    fn from(err: StorageError) -> Self {
        RecordingError::Storage(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
