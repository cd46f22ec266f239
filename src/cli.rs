use crate::config::AcquireOptions;
use crate::devices::{resolve_volume_path, volume_label};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mftgrab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy the NTFS master file table straight off a raw volume", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract $MFT into a file
    Extract {
        /// Volume to read: a drive letter, a device node or an image file
        volume: String,

        /// Output file (defaults to a timestamped name in --directory)
        #[arg(short, long, conflicts_with = "directory")]
        output: Option<PathBuf>,

        /// Directory for the timestamped output file
        #[arg(short = 'D', long, default_value = ".")]
        directory: PathBuf,

        /// Read chunk size in MiB
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..=MAX_CHUNK_MIB))]
        chunk_size: u64,

        /// Memory-map the source (image files only)
        #[arg(long)]
        mmap: bool,

        /// Replace an existing output file
        #[arg(long)]
        overwrite: bool,

        /// Print the acquisition report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the boot parameters and $MFT layout without extracting
    Info {
        /// Volume to read: a drive letter, a device node or an image file
        volume: String,

        /// Memory-map the source (image files only)
        #[arg(long)]
        mmap: bool,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Largest accepted `--chunk-size`, in MiB
pub const MAX_CHUNK_MIB: u64 = 1024;

/// `<UTC timestamp>-<volume>-MFT.bin`
pub fn default_output_name(label: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}-MFT.bin", now.format("%Y%m%dT%H%M%SZ"), label)
}

/// Builds acquisition options from the `extract` arguments.
pub fn extract_options(
    volume: &str,
    output: Option<PathBuf>,
    directory: PathBuf,
    chunk_size_mib: u64,
    mmap: bool,
    overwrite: bool,
) -> AcquireOptions {
    let output_path = output.unwrap_or_else(|| {
        directory.join(default_output_name(&volume_label(volume), Utc::now()))
    });

    AcquireOptions::new(resolve_volume_path(volume), output_path)
        .with_chunk_size(chunk_size_mib.clamp(1, MAX_CHUNK_MIB) as usize * 1024 * 1024)
        .with_mmap(mmap)
        .with_overwrite(overwrite)
}

pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn for_extraction(total_bytes: u64) -> Self {
        let bar = ProgressBar::new(total_bytes);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("Extracting $MFT using data runs...");
        Self { bar }
    }

    pub fn update(&self, done: u64, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(done);
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
