// SPDX-License-Identifier: MPL-2.0

//! CLI commands
//!
//! Each command drives the camera screen the way a user would, against the
//! virtual camera:
//! - Listing cameras, configuration and recent media
//! - Taking photos
//! - Recording videos
//! - Scanning QR codes from image files

use camapp::app::{AppModel, Backends, MessageReceiver, Notice, ScanKind, ScanResultPresenter};
use camapp::backends::camera::virtual_camera::VirtualSettings;
use camapp::backends::camera::{CameraFacing, HeadlessSurface, VirtualCamera};
use camapp::backends::decoder::QrDecoder;
use camapp::backends::launcher::SystemUrlLauncher;
use camapp::constants::timing;
use camapp::permissions::{AutoGrantPrompt, GrantMap, Permission, PermissionPrompt, StaticPrompt};
use camapp::storage::FsMediaStorage;
use camapp::{Config, Message, ScreenView};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// List the virtual cameras, the config location and recent media
pub fn list(config: &Config) -> CliResult {
    let camera = virtual_camera(config);
    let settings = camera.settings();

    println!("Available cameras:");
    println!();
    for facing in &settings.facings {
        println!(
            "  [{}] Virtual camera {}x{}@{}fps",
            facing, settings.width, settings.height, config.preview_fps
        );
    }
    println!();

    match Config::path() {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: (no config directory)"),
    }

    let storage = FsMediaStorage::new(config.media_root());
    let rt = tokio::runtime::Runtime::new()?;
    let (photos, videos) = rt.block_on(async {
        let photos = storage.recent(&config.photo_relative_path, 5).await;
        let videos = storage.recent(&config.video_relative_path, 5).await;
        (photos, videos)
    });

    print_recent("Recent photos", &photos?);
    print_recent("Recent videos", &videos?);
    Ok(())
}

fn print_recent(title: &str, files: &[PathBuf]) {
    println!();
    println!("{}:", title);
    if files.is_empty() {
        println!("  (none)");
    }
    for file in files {
        println!("  {}", file.display());
    }
}

/// Take a photo
pub fn take_photo(mut config: Config, front: bool, flash: bool, output: Option<PathBuf>) -> CliResult {
    if let Some(dir) = output {
        config.media_root = Some(dir);
        config.photo_relative_path = ".".to_string();
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(photo_flow(config, front, flash))
}

async fn photo_flow(config: Config, front: bool, flash: bool) -> CliResult {
    let (mut screen, mut messages) = build_screen(config, Arc::new(AutoGrantPrompt));
    open_camera(&mut screen, front).await?;
    if flash {
        screen.update(Message::ToggleTorch).await;
    }

    println!("Capturing...");
    screen.update(Message::CapturePhoto).await;
    wait_for_outcome(&mut screen, &mut messages).await;

    let result = report(screen.take_notices());
    screen.update(Message::Shutdown).await;
    result
}

/// Record a video
pub fn record_video(
    mut config: Config,
    duration: u64,
    front: bool,
    torch: bool,
    audio: bool,
    output: Option<PathBuf>,
) -> CliResult {
    if let Some(dir) = output {
        config.media_root = Some(dir);
        config.video_relative_path = ".".to_string();
    }

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(video_flow(
        config,
        Duration::from_secs(duration),
        front,
        torch,
        audio,
        stop_flag,
    ))
}

async fn video_flow(
    config: Config,
    duration: Duration,
    front: bool,
    torch: bool,
    audio: bool,
    stop_flag: Arc<AtomicBool>,
) -> CliResult {
    let prompt = StaticPrompt::new(GrantMap::from([
        (Permission::Camera, true),
        (Permission::RecordAudio, audio),
    ]));
    let (mut screen, mut messages) = build_screen(config, Arc::new(prompt));
    open_camera(&mut screen, front).await?;
    if torch {
        screen.update(Message::ToggleTorch).await;
    }

    screen.update(Message::ToggleRecording).await;
    if !is_recording(&screen) {
        let result = report(screen.take_notices());
        screen.update(Message::Shutdown).await;
        return result.and(Err("Recording did not start".into()));
    }

    println!("Audio: {}", if audio { "enabled" } else { "disabled" });
    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let start = Instant::now();
    while start.elapsed() < duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        screen
            .pump_until(&mut messages, timing::CLI_PROGRESS_INTERVAL, |_| false)
            .await;
        if !is_recording(&screen) {
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;
    }
    println!();

    if is_recording(&screen) {
        screen.update(Message::ToggleRecording).await;
    }
    wait_for_outcome(&mut screen, &mut messages).await;

    let result = report(screen.take_notices());
    screen.update(Message::Shutdown).await;
    result
}

/// Decode a QR code from an image file
pub fn scan_image(image: &Path, open: bool) -> CliResult {
    let data = std::fs::read(image)?;

    let rt = tokio::runtime::Runtime::new()?;
    let barcodes = rt.block_on(QrDecoder::new().decode_bytes(Arc::from(data)))?;

    let mut presenter = ScanResultPresenter::new();
    let Some(result) = presenter.on_decoded(barcodes).cloned() else {
        println!("No code found.");
        return Ok(());
    };

    match result.kind {
        ScanKind::Link => println!("Link: {}", result.text),
        ScanKind::PlainData => println!("Data: {}", result.text),
    }

    if open {
        let url = presenter.open_link(&SystemUrlLauncher)?;
        println!("Opened {}", url);
    }
    Ok(())
}

fn virtual_camera(config: &Config) -> VirtualCamera {
    VirtualCamera::new(VirtualSettings {
        width: config.virtual_width,
        height: config.virtual_height,
        ..VirtualSettings::default()
    })
}

fn build_screen(config: Config, prompt: Arc<dyn PermissionPrompt>) -> (AppModel, MessageReceiver) {
    let backends = Backends {
        prompt,
        provider: Arc::new(virtual_camera(&config)),
        surface: Arc::new(HeadlessSurface::new()),
        storage: Arc::new(FsMediaStorage::new(config.media_root())),
        decoder: Arc::new(QrDecoder::new()),
        launcher: Arc::new(SystemUrlLauncher),
    };
    AppModel::new(config, backends)
}

/// Grant permissions and bind the requested camera
async fn open_camera(screen: &mut AppModel, front: bool) -> CliResult {
    screen.update(Message::GrantPermissionPressed).await;

    let wants_front = front;
    let facing_is_front = matches!(
        screen.view(),
        ScreenView::Camera(ref view) if view.facing == CameraFacing::Front
    );
    if wants_front != facing_is_front {
        screen.update(Message::SwitchCamera).await;
    }

    match screen.view() {
        ScreenView::Camera(view) if view.binding.is_some() => {
            println!("Using camera: {}", view.facing);
            Ok(())
        }
        ScreenView::Camera(_) => report(screen.take_notices()).and(Err("Camera not ready".into())),
        ScreenView::PermissionRequired { .. } => Err("Camera permission denied".into()),
    }
}

fn is_recording(screen: &AppModel) -> bool {
    matches!(screen.view(), ScreenView::Camera(view) if view.recording)
}

/// Wait until a saved/error notice arrives
async fn wait_for_outcome(screen: &mut AppModel, messages: &mut MessageReceiver) {
    let done = screen
        .pump_until(messages, timing::CLI_FINALIZE_TIMEOUT, |screen| {
            screen.pending_notices().any(|notice| {
                matches!(
                    notice,
                    Notice::PhotoSaved(_) | Notice::VideoSaved(_) | Notice::Error(_)
                )
            })
        })
        .await;
    if !done {
        eprintln!("Timed out waiting for the camera");
    }
}

/// Print notices; the first error becomes the command's error
fn report(notices: Vec<Notice>) -> CliResult {
    for notice in notices {
        match notice {
            Notice::Shutter => {}
            Notice::PhotoSaved(media) => println!("Photo saved: {}", media),
            Notice::VideoSaved(path) => println!("Video saved: {}", path.display()),
            Notice::Error(message) => return Err(message.into()),
        }
    }
    Ok(())
}
