// SPDX-License-Identifier: MPL-2.0

//! Headless preview surface
//!
//! Consumes preview frames without drawing them. Used by the CLI and by tests
//! to observe which binding is feeding the preview and how many frames each
//! binding delivered.

use super::{BindingId, CameraFacing, PreviewStream, PreviewSurface};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct SurfaceState {
    attached: Option<(BindingId, CameraFacing)>,
    frames: HashMap<BindingId, u64>,
    out_of_order: u64,
    attach_count: u64,
}

/// Preview surface that counts frames per binding
#[derive(Default)]
pub struct HeadlessSurface {
    state: Arc<Mutex<SurfaceState>>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding currently shown
    pub fn attached(&self) -> Option<(BindingId, CameraFacing)> {
        self.lock_state().attached
    }

    /// Frames received from `binding` so far
    pub fn frames_from(&self, binding: BindingId) -> u64 {
        self.lock_state().frames.get(&binding).copied().unwrap_or(0)
    }

    /// Frames whose sequence number did not advance (repeats or reordering)
    pub fn out_of_order_frames(&self) -> u64 {
        self.lock_state().out_of_order
    }

    /// Number of non-blank attaches
    pub fn attach_count(&self) -> u64 {
        self.lock_state().attach_count
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreviewSurface for HeadlessSurface {
    fn attach(&self, stream: Option<PreviewStream>) {
        let mut drain = self.drain.lock().unwrap_or_else(|p| p.into_inner());

        // The previous stream stops counting before the next one starts
        if let Some(handle) = drain.take() {
            handle.abort();
        }

        let Some(stream) = stream else {
            self.lock_state().attached = None;
            debug!("Preview surface blanked");
            return;
        };

        {
            let mut state = self.lock_state();
            state.attached = Some((stream.binding, stream.facing));
            state.attach_count += 1;
        }
        info!(binding = %stream.binding, facing = %stream.facing, "Preview attached");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, preview frames will not be consumed");
            return;
        };

        let state = Arc::clone(&self.state);
        let PreviewStream {
            binding,
            mut frames,
            ..
        } = stream;

        *drain = Some(runtime.spawn(async move {
            let mut last_sequence: Option<u64> = None;
            while let Some(frame) = frames.next().await {
                let mut state = state.lock().unwrap_or_else(|p| p.into_inner());
                if last_sequence.is_some_and(|last| frame.sequence <= last) {
                    state.out_of_order += 1;
                }
                last_sequence = Some(frame.sequence);
                *state.frames.entry(binding).or_insert(0) += 1;
            }
            debug!(binding = %binding, "Preview stream ended");
        }));
    }
}

impl std::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("attached", &self.attached())
            .finish()
    }
}
