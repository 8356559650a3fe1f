// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines for photos and video
//!
//! Both pipelines talk to the units of the current camera binding and never
//! block the caller while the camera works:
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────┐
//! │ CaptureUnit  │ ──▶ │ CaptureCoordinator │ ──▶ │  JPEG asset  │
//! │ (callback)   │     │  - one in flight   │     │  or scanner  │
//! └──────────────┘     └────────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────┐
//! │  VideoUnit   │ ──▶ │ RecordingController│ ──▶ │  video file  │
//! │  (events)    │     │  - Idle/Recording  │     │              │
//! └──────────────┘     └────────────────────┘     └──────────────┘
//! ```
//!
//! - [`photo`]: still capture for saving and for scanning
//! - [`video`]: recording state machine

pub mod photo;
pub mod video;

pub use photo::{CaptureCoordinator, CaptureTicket};
pub use video::{RecordingController, RecordingState};
