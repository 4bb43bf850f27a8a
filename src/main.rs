// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "barcode-scanner")]
#[command(about = "Scan barcodes and QR codes from a camera feed")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan image files (or directories of images) played as a camera feed
    Scan {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Configuration file (default: ~/.config/barcode-scanner/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after the first accepted code
        #[arg(long)]
        once: bool,

        /// Loop the images until interrupted or timed out
        #[arg(short, long = "loop")]
        looping: bool,

        /// Window for suppressing repeated identical codes, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// How long each image is shown, in milliseconds
        #[arg(long)]
        hold_ms: Option<u64>,

        /// Frame loop refresh rate
        #[arg(long)]
        fps: Option<u32>,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (default: ~/.config/barcode-scanner/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List supported barcode formats
    Formats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barcode_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            inputs,
            config,
            once,
            looping,
            debounce_ms,
            hold_ms,
            fps,
            timeout,
        } => cli::scan_files(cli::ScanOptions {
            inputs,
            config,
            once,
            looping,
            debounce_ms,
            hold_ms,
            fps,
            timeout,
        }),
        Commands::Config { config } => cli::show_config(config.as_deref()),
        Commands::Formats => cli::list_formats(),
    }
}
