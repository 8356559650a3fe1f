// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camapp")]
#[command(about = "Camera screen driven against the virtual camera")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cameras, configuration and recent media
    List,

    /// Take a photo
    Photo {
        /// Use the front camera
        #[arg(short, long)]
        front: bool,

        /// Fire the flash
        #[arg(long)]
        flash: bool,

        /// Output directory (default: ~/Pictures/CamApp Photos)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Use the front camera
        #[arg(short, long)]
        front: bool,

        /// Keep the torch on while recording
        #[arg(long)]
        torch: bool,

        /// Record without audio
        #[arg(long)]
        no_audio: bool,

        /// Output directory (default: ~/DCIM/Albums/CamApp Videos)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a QR code from an image file
    Scan {
        /// Image to scan
        image: PathBuf,

        /// Open the result if it is a link
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=camapp=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = camapp::Config::load();

    match cli.command {
        Commands::List => cli::list(&config),
        Commands::Photo {
            front,
            flash,
            output,
        } => cli::take_photo(config, front, flash, output),
        Commands::Video {
            duration,
            front,
            torch,
            no_audio,
            output,
        } => cli::record_video(config, duration, front, torch, !no_audio, output),
        Commands::Scan { image, open } => cli::scan_image(&image, open),
    }
}
