// SPDX-License-Identifier: MPL-2.0

//! Application-wide constants

use std::time::Duration;

/// Permissions requested from the grant-permission button
pub const REQUESTED_PERMISSIONS: [crate::permissions::Permission; 2] = [
    crate::permissions::Permission::Camera,
    crate::permissions::Permission::RecordAudio,
];

/// Media naming and placement
pub mod media {
    /// Photo display name prefix (`Img_<millis>.jpg`)
    pub const PHOTO_PREFIX: &str = "Img_";

    /// Video file name prefix (`VID_<millis>.<ext>`)
    pub const VIDEO_PREFIX: &str = "VID_";

    /// MIME type of saved photos
    pub const PHOTO_MIME_TYPE: &str = "image/jpeg";

    /// Extension of saved photos
    pub const PHOTO_EXTENSION: &str = "jpg";

    /// Default location of photos, relative to the media root
    pub const PHOTO_RELATIVE_PATH: &str = "Pictures/CamApp Photos";

    /// Default location of videos, relative to the media root
    pub const VIDEO_RELATIVE_PATH: &str = "DCIM/Albums/CamApp Videos";

    /// Upper bound on `_N` suffixes tried when a timestamp name is taken
    pub const MAX_NAME_SUFFIX: u32 = 99;
}

/// Capture defaults
pub mod capture {
    /// JPEG quality used for stills
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// Preview frame rate of the virtual camera
    pub const DEFAULT_PREVIEW_FPS: u32 = 30;

    /// Virtual camera still resolution
    pub const DEFAULT_WIDTH: u32 = 640;

    /// Virtual camera still resolution
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Preview channel depth; late frames are dropped rather than queued
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 2;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Give up waiting for the camera provider after this long
    pub const PROVIDER_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Poll interval of the CLI progress display
    pub const CLI_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

    /// How long the CLI waits for a finalize event after stopping a recording
    pub const CLI_FINALIZE_TIMEOUT: Duration = Duration::from_secs(5);
}
