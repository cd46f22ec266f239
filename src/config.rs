//! Acquisition options

use crate::extraction::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;

/// Options for one acquisition run
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Resolved path of the raw volume or image file
    pub device_path: PathBuf,
    /// Resolved path of the file receiving the table
    pub output_path: PathBuf,
    /// Bytes copied per read (affects memory usage)
    pub chunk_size: usize,
    /// Memory-map the source instead of issuing positional reads
    pub use_mmap: bool,
    /// Replace an existing file at `output_path`
    pub overwrite: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            device_path: PathBuf::new(),
            output_path: PathBuf::from("MFT.bin"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_mmap: false,
            overwrite: false,
        }
    }
}

impl AcquireOptions {
    /// Creates options reading from `device_path` into `output_path`
    pub fn new(device_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }
}
