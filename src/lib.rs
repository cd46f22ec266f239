pub mod acquire;
pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod extraction;
pub mod fs;
pub mod io;
pub mod planning;
pub mod types;

pub use acquire::{AcquisitionReport, MftPlan, acquire, inspect};
pub use config::AcquireOptions;
pub use error::{AcquireError, MftError, Phase, Result};
pub use io::{DiskReader, MmapVolume, VolumeSource};
pub use types::{AbsoluteRange, Completeness, Extent, ExtractionSummary};
