// SPDX-License-Identifier: MPL-2.0

//! CamApp - camera screen orchestration
//!
//! This library drives a camera screen: it asks for capture permissions, keeps
//! the preview bound to the selected camera, takes photos, records video,
//! switches between front and back cameras, toggles the torch and scans QR
//! codes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The screen model, its messages and its view
//! - [`backends`]: Camera, barcode decoder and URL launcher seams, plus a
//!   virtual camera
//! - [`pipelines`]: Photo capture coordination and the recording state machine
//! - [`permissions`]: Permission gate and prompts
//! - [`config`]: User configuration handling
//! - [`storage`]: Media naming and filesystem storage
//!
//! # Example
//!
//! ```ignore
//! let (mut screen, mut messages) = AppModel::new(config, backends);
//! screen.update(Message::GrantPermissionPressed).await;
//! screen.update(Message::CapturePhoto).await;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod permissions;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{AppModel, Backends, Message, Notice, ScreenView};
pub use backends::camera::CameraFacing;
pub use config::Config;
pub use errors::{AppError, AppResult};
