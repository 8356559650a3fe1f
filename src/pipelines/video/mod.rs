// SPDX-License-Identifier: MPL-2.0

//! Video recording
//!
//! [`RecordingController`] is the only owner of the recording handle. A
//! recording is `Idle → Recording → Idle`; the trip back to Idle happens on
//! `stop()` or on a terminal recorder event, whichever comes first. After
//! `stop()` the recorder still owes a `Finalized` event, which is tracked so
//! callers can wait for the camera to settle before rebinding.

use crate::backends::camera::{ActiveRecording, RecordEvent, RecordRequest, VideoUnit};
use crate::errors::RecordingError;
use crate::storage::{MediaEntry, MediaStorage};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Recording state machine
#[derive(Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        id: Uuid,
        /// When recording started
        start_time: Instant,
        /// Output file path
        output: PathBuf,
        with_audio: bool,
        torch: bool,
        handle: Box<dyn ActiveRecording>,
    },
}

impl std::fmt::Debug for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Recording {
                id,
                start_time,
                output,
                ..
            } => write!(
                f,
                "Recording {{ id: {}, output: {}, elapsed: {:?} }}",
                id,
                output.display(),
                start_time.elapsed()
            ),
        }
    }
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Output path of the running recording
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { output, .. } => Some(output),
        }
    }

    /// Time since the recording started
    pub fn elapsed(&self) -> Duration {
        match self {
            RecordingState::Idle => Duration::ZERO,
            RecordingState::Recording { start_time, .. } => start_time.elapsed(),
        }
    }
}

pub struct RecordingController {
    state: RecordingState,
    finalizing: HashSet<Uuid>,
    storage: Arc<dyn MediaStorage>,
    video_relative_path: String,
}

impl RecordingController {
    pub fn new(storage: Arc<dyn MediaStorage>, video_relative_path: impl Into<String>) -> Self {
        Self {
            state: RecordingState::Idle,
            finalizing: HashSet::new(),
            storage,
            video_relative_path: video_relative_path.into(),
        }
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Idle with no finalize outstanding
    pub fn is_settled(&self) -> bool {
        !self.is_recording() && self.finalizing.is_empty()
    }

    /// Torch setting of the running recording
    pub fn active_torch(&self) -> Option<bool> {
        match &self.state {
            RecordingState::Recording { torch, .. } => Some(*torch),
            RecordingState::Idle => None,
        }
    }

    /// Start recording on `unit`.
    ///
    /// `on_event` receives every recorder event tagged with the recording id;
    /// feed them back through [`Self::on_event`].
    pub async fn start<F>(
        &mut self,
        unit: &dyn VideoUnit,
        torch: bool,
        audio_granted: bool,
        on_event: F,
    ) -> Result<Uuid, RecordingError>
    where
        F: Fn(Uuid, RecordEvent) + Send + Sync + 'static,
    {
        if self.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let entry = MediaEntry::video(&self.video_relative_path, unit.container());
        let output = self.storage.allocate(&entry).await?;

        let id = Uuid::new_v4();
        let request = RecordRequest {
            output: output.clone(),
            with_audio: audio_granted,
            torch,
        };

        let handle = match unit.start(request, Arc::new(move |event: RecordEvent| on_event(id, event))) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Recorder refused to start");
                if let Err(e) = tokio::fs::remove_file(&output).await {
                    debug!(error = %e, "Could not remove unused output");
                }
                return Err(RecordingError::StartFailed(e.to_string()));
            }
        };

        info!(%id, output = %output.display(), audio = audio_granted, torch, "Recording started");
        self.state = RecordingState::Recording {
            id,
            start_time: Instant::now(),
            output,
            with_audio: audio_granted,
            torch,
            handle,
        };
        Ok(id)
    }

    /// Ask the recorder to finalize and return to Idle.
    ///
    /// Returns the output path; `None` (and no effect) when Idle.
    pub fn stop(&mut self) -> Option<PathBuf> {
        match std::mem::take(&mut self.state) {
            RecordingState::Idle => {
                debug!("Stop requested while idle");
                None
            }
            RecordingState::Recording {
                id,
                start_time,
                output,
                handle,
                ..
            } => {
                self.finalizing.insert(id);
                handle.stop();
                info!(%id, elapsed = ?start_time.elapsed(), "Recording stopping");
                Some(output)
            }
        }
    }

    /// Apply a recorder event.
    ///
    /// Returns the outcome when `event` is the terminal event of a recording
    /// this controller started.
    pub fn on_event(
        &mut self,
        id: Uuid,
        event: RecordEvent,
    ) -> Option<Result<PathBuf, RecordingError>> {
        match event {
            RecordEvent::Started => {
                debug!(%id, "Recorder started writing");
                None
            }
            RecordEvent::Finalized(result) => {
                let was_stopping = self.finalizing.remove(&id);
                let was_current = matches!(&self.state, RecordingState::Recording { id: current, .. } if *current == id);

                if was_current {
                    // Recorder ended on its own; nothing left to stop
                    self.state = RecordingState::Idle;
                } else if !was_stopping {
                    warn!(%id, "Finalize for an unknown recording");
                    return None;
                }

                match &result {
                    Ok(path) => info!(%id, path = %path.display(), "Recording finalized"),
                    Err(e) => warn!(%id, error = %e, "Recording finalized with an error"),
                }
                Some(result.map_err(|e| RecordingError::FinalizeFailed(e.to_string())))
            }
        }
    }
}

impl std::fmt::Debug for RecordingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingController")
            .field("state", &self.state)
            .field("finalizing", &self.finalizing.len())
            .finish()
    }
}
