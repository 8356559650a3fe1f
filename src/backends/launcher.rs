// SPDX-License-Identifier: MPL-2.0

//! Opening links in the system browser

use crate::errors::ScanError;
use tracing::{error, info};

/// Hands a URL to whatever the system uses to open it
pub trait UrlLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ScanError>;
}

/// Launcher backed by the desktop's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUrlLauncher;

impl UrlLauncher for SystemUrlLauncher {
    fn open(&self, url: &str) -> Result<(), ScanError> {
        match open::that_detached(url) {
            Ok(()) => {
                info!(url = %url, "URL opened");
                Ok(())
            }
            Err(err) => {
                error!(url = %url, error = %err, "Failed to open URL");
                Err(ScanError::LaunchFailed(err.to_string()))
            }
        }
    }
}
