// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The platform camera stack is an external collaborator. This module names
//! the seams the application talks to:
//!
//! ```text
//! ┌──────────────────────────┐
//! │ CameraSessionController  │  ← one live binding at a time
//! └────────────┬─────────────┘
//!              │ get_instance (one-shot callback)
//!              ▼
//! ┌──────────────────────────┐
//! │ ProviderSource           │
//! └────────────┬─────────────┘
//!              │ bind / unbind_all
//!              ▼
//! ┌──────────────────────────┐
//! │ CameraProvider           │──► PreviewStream ──► PreviewSurface
//! └────────────┬─────────────┘
//!              ├──► CaptureUnit  (take_picture, callback)
//!              └──► VideoUnit    (start, event listener)
//! ```
//!
//! Every call that produces a result later takes a callback instead of
//! blocking; [`bridge`] turns those callbacks into futures.

pub mod bridge;
pub mod preview;
pub mod session;
pub mod types;
pub mod virtual_camera;

pub use preview::HeadlessSurface;
pub use session::{CameraSessionController, SessionBinding, SessionSettings};
pub use types::*;
pub use virtual_camera::VirtualCamera;

use crate::flash::FlashMode;
use std::sync::Arc;

/// Delivers the camera provider once per `get_instance` call
pub type ProviderListener = Box<dyn FnOnce(BackendResult<Arc<dyn CameraProvider>>) + Send>;

/// Completion callback of a still capture
pub type CaptureCallback = Box<dyn FnOnce(BackendResult<CapturedImage>) + Send>;

/// Receives recorder lifecycle events; may be called from any thread
pub type RecordListener = Arc<dyn Fn(RecordEvent) + Send + Sync>;

/// Asynchronous, one-shot access to the camera provider
pub trait ProviderSource: Send + Sync {
    /// Request the provider. `listener` is called exactly once, possibly
    /// before this method returns.
    fn get_instance(&self, listener: ProviderListener);
}

/// Binds units to the physical camera
pub trait CameraProvider: Send + Sync {
    /// Bind preview, capture and (optionally) video units for `request.facing`.
    ///
    /// Either every unit is bound or none is.
    fn bind(&self, request: BindRequest) -> BackendResult<BoundSession>;

    /// Release every bound unit. Calling it with nothing bound is a no-op.
    fn unbind_all(&self);
}

/// Still image capture
pub trait CaptureUnit: Send + Sync {
    /// Start a capture and return immediately; `callback` receives the result.
    fn take_picture(&self, flash: FlashMode, callback: CaptureCallback);
}

/// Continuous video capture
pub trait VideoUnit: Send + Sync {
    /// Container written by this unit
    fn container(&self) -> VideoContainer;

    /// Start recording into `request.output`.
    ///
    /// `listener` receives [`RecordEvent::Started`] and, last, exactly one
    /// [`RecordEvent::Finalized`].
    fn start(
        &self,
        request: RecordRequest,
        listener: RecordListener,
    ) -> BackendResult<Box<dyn ActiveRecording>>;
}

/// Handle to a recording in progress
pub trait ActiveRecording: Send {
    /// Ask the recorder to finalize. The outcome arrives as `Finalized`.
    fn stop(self: Box<Self>);
}

/// Display target of the preview
pub trait PreviewSurface: Send + Sync {
    /// Show `stream`, replacing whatever was shown. `None` blanks the surface.
    fn attach(&self, stream: Option<PreviewStream>);
}
