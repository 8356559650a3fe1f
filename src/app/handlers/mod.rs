// SPDX-License-Identifier: MPL-2.0

//! Message handler modules, grouped by domain

pub mod camera;
pub mod capture;
pub mod system;
