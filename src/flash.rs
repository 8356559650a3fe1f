// SPDX-License-Identifier: MPL-2.0

//! Flash and torch state

/// Flash operating mode handed to the capture unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashMode {
    /// Flash LED is off
    #[default]
    Off,
    /// Flash fires during photo capture
    On,
    /// LED stays on continuously
    Torch,
}

impl FlashMode {
    /// Flash mode for a still capture.
    ///
    /// While a recording is running the light follows the recording's torch
    /// setting, so a photo taken mid-recording never switches it on or off.
    pub fn for_capture(torch: TorchState, recording_torch: Option<bool>) -> Self {
        match recording_torch {
            Some(true) => FlashMode::Torch,
            Some(false) => FlashMode::Off,
            None if torch.is_enabled() => FlashMode::On,
            None => FlashMode::Off,
        }
    }
}

/// User torch toggle, independent of the camera facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TorchState {
    enabled: bool,
}

impl TorchState {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(self) -> bool {
        self.enabled
    }

    /// Flip the toggle and return the new state
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torch_toggle() {
        let mut torch = TorchState::default();
        assert!(!torch.is_enabled());
        assert!(torch.toggle());
        assert!(!torch.toggle());
    }

    #[test]
    fn test_capture_flash_without_recording() {
        assert_eq!(
            FlashMode::for_capture(TorchState::new(true), None),
            FlashMode::On
        );
        assert_eq!(
            FlashMode::for_capture(TorchState::new(false), None),
            FlashMode::Off
        );
    }

    #[test]
    fn test_capture_flash_follows_recording() {
        // The recording's torch wins over the current toggle
        assert_eq!(
            FlashMode::for_capture(TorchState::new(false), Some(true)),
            FlashMode::Torch
        );
        assert_eq!(
            FlashMode::for_capture(TorchState::new(true), Some(false)),
            FlashMode::Off
        );
    }
}
