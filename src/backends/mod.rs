// SPDX-License-Identifier: MPL-2.0

//! Backends for the external collaborators of the camera screen
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐   │
//! │  │   Camera    │    │  Barcode decoder │   │
//! │  │ (provider)  │    │      (rqrr)      │   │
//! │  └─────────────┘    └──────────────────┘   │
//! │                     ┌──────────────────┐   │
//! │                     │   URL launcher   │   │
//! │                     │      (open)      │   │
//! │                     └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: provider, units, preview surface and the session controller
//! - [`decoder`]: QR decoding of still images
//! - [`launcher`]: opening scanned links

pub mod camera;
pub mod decoder;
pub mod launcher;
