// SPDX-License-Identifier: MPL-2.0

//! Virtual camera backend
//!
//! A synthetic camera with the same asynchronous shape as a platform camera
//! stack: the provider is delivered through a callback, captures complete on a
//! background task, and recordings report `Started`/`Finalized` events.
//!
//! ```text
//! get_instance ──► VirtualCamera (provider)
//!                      │ bind
//!                      ├──► preview task ──► PreviewStream (RGBA test pattern)
//!                      ├──► VirtualCaptureUnit ──► JPEG still
//!                      └──► VirtualVideoUnit ──► Motion-JPEG file
//! ```
//!
//! Like real hardware it refuses a second bind while one is active, which
//! makes double-binding observable. Failures can be injected for tests.

use super::{
    ActiveRecording, BackendError, BackendResult, BindRequest, BindingId, BoundSession,
    CameraFacing, CameraProvider, CaptureCallback, CaptureUnit, CapturedImage, FrameSender,
    PreviewFrame, PreviewStream, ProviderListener, ProviderSource, RecordEvent, RecordListener,
    RecordRequest, VideoContainer, VideoUnit,
};
use crate::constants::capture;
use crate::flash::FlashMode;
use image::{ImageBuffer, Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Container written by the virtual recorder
pub const VIRTUAL_CONTAINER: VideoContainer = VideoContainer {
    extension: "mjpeg",
    mime_type: "video/x-motion-jpeg",
};

/// Static description of the virtual device
#[derive(Debug, Clone)]
pub struct VirtualSettings {
    pub width: u32,
    pub height: u32,
    /// Delay before the provider is handed out
    pub acquire_delay: Duration,
    /// Facings this device has
    pub facings: Vec<CameraFacing>,
}

impl Default for VirtualSettings {
    fn default() -> Self {
        Self {
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
            acquire_delay: Duration::ZERO,
            facings: CameraFacing::ALL.to_vec(),
        }
    }
}

/// Counters exposed for tests and diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualStats {
    /// Successful binds
    pub binds: u64,
    /// Unbinds that released a binding
    pub unbinds: u64,
    /// Binds refused because another binding was still active
    pub double_bind_attempts: u64,
    /// Currently bound session
    pub active: Option<(BindingId, CameraFacing)>,
    /// Stills delivered
    pub captures: u64,
    /// Stills that failed
    pub failed_captures: u64,
    /// Flash mode of the most recent capture request
    pub last_flash: Option<FlashMode>,
    /// Recordings started
    pub recordings: u64,
    /// Parameters of the most recent recording
    pub last_record_request: Option<RecordRequest>,
}

#[derive(Debug)]
struct ActiveBinding {
    id: BindingId,
    facing: CameraFacing,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct VirtualState {
    stats: VirtualStats,
    active: Option<ActiveBinding>,
    fail_next_acquire: Option<String>,
    fail_next_bind: Option<String>,
    failing_captures: u32,
    fail_next_finalize: Option<String>,
    capture_delay: Duration,
    recording_abort: Option<CancellationToken>,
}

impl VirtualState {
    fn is_bound(&self, binding: BindingId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.id == binding && !active.token.is_cancelled())
    }
}

/// Virtual camera: provider source and provider in one
#[derive(Clone, Default)]
pub struct VirtualCamera {
    state: Arc<Mutex<VirtualState>>,
    settings: Arc<VirtualSettings>,
}

impl VirtualCamera {
    pub fn new(settings: VirtualSettings) -> Self {
        Self {
            state: Arc::default(),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &VirtualSettings {
        &self.settings
    }

    pub fn stats(&self) -> VirtualStats {
        self.lock().stats.clone()
    }

    /// Make the next provider acquisition fail
    pub fn fail_next_acquire(&self, reason: impl Into<String>) {
        self.lock().fail_next_acquire = Some(reason.into());
    }

    /// Make the next bind fail
    pub fn fail_next_bind(&self, reason: impl Into<String>) {
        self.lock().fail_next_bind = Some(reason.into());
    }

    /// Make the next `count` captures fail with a sensor error
    pub fn fail_next_captures(&self, count: u32) {
        self.lock().failing_captures = count;
    }

    /// Make the next recording finalize with an error
    pub fn fail_next_finalize(&self, reason: impl Into<String>) {
        self.lock().fail_next_finalize = Some(reason.into());
    }

    /// Delay every capture by `delay`
    pub fn set_capture_delay(&self, delay: Duration) {
        self.lock().capture_delay = delay;
    }

    /// Simulate a fatal recorder error on the running recording
    pub fn abort_recording(&self) {
        if let Some(abort) = self.lock().recording_abort.take() {
            abort.cancel();
        }
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for VirtualCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualCamera")
            .field("settings", &self.settings)
            .field("active", &self.lock().stats.active)
            .finish()
    }
}

impl ProviderSource for VirtualCamera {
    fn get_instance(&self, listener: ProviderListener) {
        let result: BackendResult<Arc<dyn CameraProvider>> = match self.lock().fail_next_acquire.take()
        {
            Some(reason) => Err(BackendError::NotAvailable(reason)),
            None => Ok(Arc::new(self.clone())),
        };

        let delay = self.settings.acquire_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    listener(result);
                });
            }
            Err(_) => listener(result),
        }
    }
}

impl CameraProvider for VirtualCamera {
    fn bind(&self, request: BindRequest) -> BackendResult<BoundSession> {
        let mut state = self.lock();

        if let Some(reason) = state.fail_next_bind.take() {
            return Err(BackendError::BindFailed(reason));
        }

        if !self.settings.facings.contains(&request.facing) {
            return Err(BackendError::DeviceNotFound(format!(
                "no {} camera",
                request.facing
            )));
        }

        if let Some(active) = &state.active {
            let active_id = active.id;
            state.stats.double_bind_attempts += 1;
            warn!(active = %active_id, requested = %request.id, "Refusing to bind over an active session");
            return Err(BackendError::DeviceBusy(format!(
                "binding {} is still active",
                active_id
            )));
        }

        let token = CancellationToken::new();
        state.active = Some(ActiveBinding {
            id: request.id,
            facing: request.facing,
            token: token.clone(),
        });
        state.stats.binds += 1;
        state.stats.active = Some((request.id, request.facing));
        drop(state);

        info!(binding = %request.id, facing = %request.facing, "Virtual camera bound");

        let (sender, frames) = futures::channel::mpsc::channel(capture::PREVIEW_CHANNEL_CAPACITY);
        spawn_preview(
            request.id,
            request.facing,
            Arc::clone(&self.settings),
            request.preview.fps,
            token.clone(),
            sender,
        );

        let capture = Arc::new(VirtualCaptureUnit {
            binding: request.id,
            facing: request.facing,
            jpeg_quality: request.capture.jpeg_quality,
            camera: self.clone(),
            token: token.clone(),
        });

        let video = request.video.map(|_| {
            Arc::new(VirtualVideoUnit {
                binding: request.id,
                facing: request.facing,
                fps: request.preview.fps,
                camera: self.clone(),
                token,
            }) as Arc<dyn VideoUnit>
        });

        Ok(BoundSession {
            id: request.id,
            facing: request.facing,
            preview: PreviewStream {
                binding: request.id,
                facing: request.facing,
                frames,
            },
            capture,
            video,
        })
    }

    fn unbind_all(&self) {
        let mut state = self.lock();
        if let Some(active) = state.active.take() {
            active.token.cancel();
            state.stats.unbinds += 1;
            state.stats.active = None;
            info!(binding = %active.id, facing = %active.facing, "Virtual camera unbound");
        }
    }
}

/// Produce preview frames until the binding is torn down or the receiver is gone
fn spawn_preview(
    binding: BindingId,
    facing: CameraFacing,
    settings: Arc<VirtualSettings>,
    fps: u32,
    token: CancellationToken,
    mut sender: FrameSender,
) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("No async runtime, virtual preview disabled");
        return;
    };

    runtime.spawn(async move {
        let width = (settings.width / 4).max(1);
        let height = (settings.height / 4).max(1);
        let pattern = image::DynamicImage::ImageRgb8(render_pattern(width, height, facing, 0));
        let data: Arc<[u8]> = Arc::from(pattern.to_rgba8().into_raw());

        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps.max(1) as f64));
        let mut sequence = 0u64;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let frame = PreviewFrame {
                binding,
                sequence,
                width,
                height,
                data: Arc::clone(&data),
                captured_at: Instant::now(),
            };
            sequence += 1;

            match sender.try_send(frame) {
                Ok(()) => {}
                // Surface is behind; drop the frame rather than queue it
                Err(e) if e.is_full() => {}
                Err(_) => break,
            }
        }

        debug!(binding = %binding, frames = sequence, "Virtual preview stopped");
    });
}

struct VirtualCaptureUnit {
    binding: BindingId,
    facing: CameraFacing,
    jpeg_quality: u8,
    camera: VirtualCamera,
    token: CancellationToken,
}

impl CaptureUnit for VirtualCaptureUnit {
    fn take_picture(&self, flash: FlashMode, callback: CaptureCallback) {
        let delay = {
            let mut state = self.camera.lock();
            state.stats.last_flash = Some(flash);

            if !state.is_bound(self.binding) {
                drop(state);
                callback(Err(BackendError::Unbound));
                return;
            }

            if state.failing_captures > 0 {
                state.failing_captures -= 1;
                state.stats.failed_captures += 1;
                drop(state);
                callback(Err(BackendError::CaptureFailed(
                    "simulated sensor error".to_string(),
                )));
                return;
            }

            state.capture_delay
        };

        let (width, height) = (self.camera.settings.width, self.camera.settings.height);
        let facing = self.facing;
        let quality = self.jpeg_quality;
        let camera = self.camera.clone();
        let token = self.token.clone();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let result = render_still(width, height, facing, flash, quality);
            camera.record_capture(&result);
            callback(result);
            return;
        };

        runtime.spawn(async move {
            let unbound = tokio::select! {
                _ = token.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if unbound {
                callback(Err(BackendError::Unbound));
                return;
            }

            let result = tokio::task::spawn_blocking(move || {
                render_still(width, height, facing, flash, quality)
            })
            .await
            .unwrap_or_else(|e| Err(BackendError::CaptureFailed(e.to_string())));

            camera.record_capture(&result);
            callback(result);
        });
    }
}

impl VirtualCamera {
    fn record_capture(&self, result: &BackendResult<CapturedImage>) {
        let mut state = self.lock();
        match result {
            Ok(_) => state.stats.captures += 1,
            Err(_) => state.stats.failed_captures += 1,
        }
    }
}

struct VirtualVideoUnit {
    binding: BindingId,
    facing: CameraFacing,
    fps: u32,
    camera: VirtualCamera,
    token: CancellationToken,
}

struct VirtualRecording {
    stop: tokio::sync::oneshot::Sender<()>,
}

impl ActiveRecording for VirtualRecording {
    fn stop(self: Box<Self>) {
        // The writer treats a dropped sender the same way
        let _ = self.stop.send(());
    }
}

impl VideoUnit for VirtualVideoUnit {
    fn container(&self) -> VideoContainer {
        VIRTUAL_CONTAINER
    }

    fn start(
        &self,
        request: RecordRequest,
        listener: RecordListener,
    ) -> BackendResult<Box<dyn ActiveRecording>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| BackendError::RecordingFailed("no async runtime".to_string()))?;

        let abort = CancellationToken::new();
        let finalize_failure = {
            let mut state = self.camera.lock();
            if !state.is_bound(self.binding) {
                return Err(BackendError::Unbound);
            }
            state.stats.recordings += 1;
            state.stats.last_record_request = Some(request.clone());
            state.recording_abort = Some(abort.clone());
            state.fail_next_finalize.take()
        };

        info!(
            output = %request.output.display(),
            audio = request.with_audio,
            torch = request.torch,
            "Virtual recording started"
        );

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
        let job = RecordJob {
            request,
            facing: self.facing,
            width: self.camera.settings.width,
            height: self.camera.settings.height,
            fps: self.fps,
            unbound: self.token.clone(),
            abort,
            finalize_failure,
        };

        runtime.spawn(async move {
            let result = job.run(stop_rx, &listener).await;
            if let Err(e) = &result {
                warn!(error = %e, "Virtual recording failed");
            }
            listener(RecordEvent::Finalized(result));
        });

        Ok(Box::new(VirtualRecording { stop: stop_tx }))
    }
}

struct RecordJob {
    request: RecordRequest,
    facing: CameraFacing,
    width: u32,
    height: u32,
    fps: u32,
    unbound: CancellationToken,
    abort: CancellationToken,
    finalize_failure: Option<String>,
}

impl RecordJob {
    async fn run(
        self,
        mut stop: tokio::sync::oneshot::Receiver<()>,
        listener: &RecordListener,
    ) -> BackendResult<PathBuf> {
        let (width, height, facing) = (self.width, self.height, self.facing);
        let flash = if self.request.torch {
            FlashMode::Torch
        } else {
            FlashMode::Off
        };
        let frame = tokio::task::spawn_blocking(move || {
            render_still(width, height, facing, flash, capture::DEFAULT_JPEG_QUALITY)
        })
        .await
        .map_err(|e| BackendError::RecordingFailed(e.to_string()))??;

        let mut file = tokio::fs::File::create(&self.request.output).await?;
        listener(RecordEvent::Started);

        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(1.0 / self.fps.max(1) as f64));
        let mut frames = 0u64;

        loop {
            // A requested stop wins over an unbind arriving with it
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = self.unbound.cancelled() => {
                    return Err(BackendError::RecordingFailed(
                        "camera was unbound while recording".to_string(),
                    ));
                }
                _ = self.abort.cancelled() => {
                    return Err(BackendError::RecordingFailed(
                        "recorder reported a fatal error".to_string(),
                    ));
                }
                _ = interval.tick() => {
                    file.write_all(&frame.data).await?;
                    frames += 1;
                }
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        debug!(frames, output = %self.request.output.display(), "Virtual recording flushed");

        match self.finalize_failure {
            Some(reason) => Err(BackendError::RecordingFailed(reason)),
            None => Ok(self.request.output),
        }
    }
}

/// Diagonal gradient, blue-ish for the back camera and warm for the front one
fn render_pattern(width: u32, height: u32, facing: CameraFacing, boost: u8) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let fx = (x * 255 / width.max(1)) as u8;
        let fy = (y * 255 / height.max(1)) as u8;
        let base = match facing {
            CameraFacing::Back => [fx / 2, fy / 2, 200],
            CameraFacing::Front => [220, fx / 2, fy / 2],
        };
        Rgb(base.map(|channel| channel.saturating_add(boost)))
    })
}

/// Render and JPEG-encode one still
fn render_still(
    width: u32,
    height: u32,
    facing: CameraFacing,
    flash: FlashMode,
    quality: u8,
) -> BackendResult<CapturedImage> {
    let boost = match flash {
        FlashMode::Off => 0,
        FlashMode::On | FlashMode::Torch => 40,
    };
    let image = render_pattern(width, height, facing, boost);

    let mut buffer = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::CaptureFailed(format!("JPEG encoding failed: {}", e)))?;
    }

    Ok(CapturedImage {
        data: Arc::from(buffer),
        width,
        height,
        facing,
        captured_at: Instant::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::bridge;
    use crate::backends::camera::{CaptureConfig, PreviewConfig, VideoConfig};

    fn request(id: u64, facing: CameraFacing) -> BindRequest {
        BindRequest {
            id: BindingId(id),
            facing,
            preview: PreviewConfig { fps: 30 },
            capture: CaptureConfig { jpeg_quality: 80 },
            video: Some(VideoConfig::default()),
        }
    }

    #[test]
    fn test_render_still_is_jpeg() {
        let still = render_still(32, 24, CameraFacing::Back, FlashMode::Off, 80).unwrap();
        assert_eq!(&still.data[..2], &[0xFF, 0xD8]);
        assert_eq!((still.width, still.height), (32, 24));
    }

    #[test]
    fn test_front_and_back_patterns_differ() {
        let back = render_pattern(8, 8, CameraFacing::Back, 0);
        let front = render_pattern(8, 8, CameraFacing::Front, 0);
        assert_ne!(back.as_raw(), front.as_raw());
    }

    #[tokio::test]
    async fn test_refuses_double_bind() {
        let camera = VirtualCamera::default();
        let _first = camera.bind(request(1, CameraFacing::Back)).unwrap();

        let second = camera.bind(request(2, CameraFacing::Front));
        assert!(matches!(second, Err(BackendError::DeviceBusy(_))));
        assert_eq!(camera.stats().double_bind_attempts, 1);

        camera.unbind_all();
        assert!(camera.bind(request(3, CameraFacing::Front)).is_ok());
        assert_eq!(camera.stats().active, Some((BindingId(3), CameraFacing::Front)));
    }

    #[tokio::test]
    async fn test_missing_facing() {
        let camera = VirtualCamera::new(VirtualSettings {
            facings: vec![CameraFacing::Back],
            ..VirtualSettings::default()
        });
        let result = camera.bind(request(1, CameraFacing::Front));
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
        assert_eq!(camera.stats().active, None);
    }

    #[tokio::test]
    async fn test_capture_after_unbind_reports_unbound() {
        let camera = VirtualCamera::default();
        let session = camera.bind(request(1, CameraFacing::Back)).unwrap();
        camera.unbind_all();

        let (resolver, pending) = bridge::bridge("capture");
        session.capture.take_picture(
            FlashMode::Off,
            Box::new(move |result: BackendResult<CapturedImage>| {
                resolver.resolve(result);
            }),
        );
        let result = pending.wait(&CancellationToken::new()).await.unwrap();
        assert_eq!(result.unwrap_err(), BackendError::Unbound);
    }

    #[tokio::test]
    async fn test_acquire_failure_is_delivered_once() {
        let camera = VirtualCamera::default();
        camera.fail_next_acquire("no camera service");

        let (resolver, pending) = bridge::bridge("provider");
        camera.get_instance(Box::new(move |result: BackendResult<Arc<dyn CameraProvider>>| {
            resolver.resolve(result.map(|_| ()));
        }));
        let result = pending.wait(&CancellationToken::new()).await.unwrap();
        assert!(matches!(result, Err(BackendError::NotAvailable(_))));
    }
}
