//! Acquisition pipeline
//!
//! Boot sector, self-record, run-list, range plan, copy: strictly in that
//! order, each step consuming the previous one's output. The table is staged
//! in a temporary file next to the destination and only moved into place
//! once every range has been copied, so a failed run leaves nothing behind.

use crate::config::AcquireOptions;
use crate::error::{AcquireError, MftError, Phase, PhaseExt};
use crate::extraction::extract_ranges;
use crate::fs::ntfs::{MftLayout, MftReader};
use crate::io::{DiskReader, MmapVolume, VolumeSource};
use crate::planning::{plan_ranges, planned_bytes};
use crate::types::{AbsoluteRange, Completeness, ExtractionSummary, format_bytes};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub type AcquireResult<T> = std::result::Result<T, AcquireError>;

/// Decoded layout plus the ranges that will be copied
#[derive(Debug, Clone, Serialize)]
pub struct MftPlan {
    pub layout: MftLayout,
    pub ranges: Vec<AbsoluteRange>,
}

impl MftPlan {
    pub fn planned_bytes(&self) -> u64 {
        planned_bytes(&self.ranges)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionReport {
    pub device: PathBuf,
    pub output: PathBuf,
    pub plan: MftPlan,
    pub summary: ExtractionSummary,
    pub completeness: Completeness,
}

/// Opens the configured source for reading.
pub fn open_volume(options: &AcquireOptions) -> AcquireResult<Box<dyn VolumeSource>> {
    let volume: Box<dyn VolumeSource> = if options.use_mmap {
        Box::new(MmapVolume::open(&options.device_path).phase(Phase::OpenVolume)?)
    } else {
        Box::new(DiskReader::open(&options.device_path).phase(Phase::OpenVolume)?)
    };

    tracing::info!(
        "Opened {} ({})",
        options.device_path.display(),
        format_bytes(volume.size())
    );

    Ok(volume)
}

/// Locates the table and plans the copy without writing anything.
pub fn inspect<V: VolumeSource + ?Sized>(volume: &mut V) -> AcquireResult<MftPlan> {
    let mut reader = MftReader::new(volume).phase(Phase::BootSector)?;
    let layout = reader.layout().phase(Phase::SelfRecord)?;
    let ranges = plan_ranges(
        &layout.extents,
        layout.bytes_per_cluster(),
        layout.logical_size(),
    )
    .phase(Phase::Planning)?;

    tracing::info!(
        "Planned {} ranges, {} of {} logical bytes",
        ranges.len(),
        planned_bytes(&ranges),
        layout.logical_size()
    );

    Ok(MftPlan { layout, ranges })
}

/// Copies the planned ranges into `output`.
pub fn write_table<V: VolumeSource + ?Sized>(
    volume: &mut V,
    plan: &MftPlan,
    output: &Path,
    options: &AcquireOptions,
    progress: Option<&dyn Fn(u64, u64)>,
) -> AcquireResult<ExtractionSummary> {
    let mut staging = NamedTempFile::new_in(staging_dir(output))
        .map_err(MftError::from)
        .phase(Phase::Output)?;

    let summary = extract_ranges(
        &plan.ranges,
        volume,
        staging.as_file_mut(),
        plan.layout.logical_size(),
        options.chunk_size,
        progress,
    )
    .phase(Phase::Extraction)?;

    staging
        .as_file()
        .sync_all()
        .map_err(MftError::from)
        .phase(Phase::Output)?;

    let persisted = if options.overwrite {
        staging.persist(output)
    } else {
        staging.persist_noclobber(output)
    };
    persisted
        .map_err(|e| MftError::Io(e.error))
        .phase(Phase::Output)?;

    Ok(summary)
}

/// Runs the whole pipeline for the configured device and output.
pub fn acquire(
    options: &AcquireOptions,
    progress: Option<&dyn Fn(u64, u64)>,
) -> AcquireResult<AcquisitionReport> {
    let mut volume = open_volume(options)?;
    let plan = inspect(&mut *volume)?;
    let summary = write_table(
        &mut *volume,
        &plan,
        &options.output_path,
        options,
        progress,
    )?;

    let completeness = summary.completeness();
    match completeness {
        Completeness::Complete => tracing::info!(
            "Extracted {} bytes, equal to the logical size of $MFT",
            summary.bytes_extracted
        ),
        Completeness::Partial { shortfall } => tracing::warn!(
            "Extracted {} bytes, {} short of the logical size of $MFT ({} bytes)",
            summary.bytes_extracted,
            shortfall,
            summary.logical_size
        ),
    }

    Ok(AcquisitionReport {
        device: options.device_path.clone(),
        output: options.output_path.clone(),
        plan,
        summary,
        completeness,
    })
}

fn staging_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
