use super::boot_sector::{BOOT_SECTOR_OFFSET, BOOT_SECTOR_SIZE, BootParameters};
use super::record::{DataAttribute, MetadataRecord};
use super::runlist::decode_run_list;
use crate::error::Result;
use crate::io::VolumeSource;
use crate::types::Extent;
use serde::Serialize;

/// Everything learned about the table before any of it is copied
#[derive(Debug, Clone, Serialize)]
pub struct MftLayout {
    pub boot: BootParameters,
    pub data_attribute: DataAttribute,
    pub fixup_sectors: usize,
    pub run_list_hex: String,
    pub extents: Vec<Extent>,
}

impl MftLayout {
    #[inline]
    pub fn logical_size(&self) -> u64 {
        self.data_attribute.logical_size
    }

    #[inline]
    pub fn bytes_per_cluster(&self) -> u64 {
        self.boot.bytes_per_cluster()
    }

    /// Sum of all extent lengths before clipping to the logical size
    pub fn allocated_size(&self) -> u64 {
        self.extents
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.length_bytes))
    }
}

/// Locates `$MFT` on an NTFS volume in two phases: geometry from the boot
/// sector first, then the self-record that geometry points at.
pub struct MftReader<V: VolumeSource> {
    volume: V,
    boot: BootParameters,
}

impl<V: VolumeSource> MftReader<V> {
    pub fn new(mut volume: V) -> Result<Self> {
        let mut sector = vec![0u8; BOOT_SECTOR_SIZE];
        volume.read_exact_at(BOOT_SECTOR_OFFSET, &mut sector)?;
        let boot = BootParameters::parse(&sector)?;

        tracing::info!(
            "NTFS boot sector: {} bytes/sector, {} sectors/cluster, $MFT at cluster {} (byte {}), record size {}",
            boot.bytes_per_sector,
            boot.sectors_per_cluster,
            boot.mft_start_cluster,
            boot.mft_offset(),
            boot.record_size
        );

        Ok(Self { volume, boot })
    }

    #[inline]
    pub fn boot_parameters(&self) -> &BootParameters {
        &self.boot
    }

    /// Reads and decodes the self-record into the table's layout.
    pub fn layout(&mut self) -> Result<MftLayout> {
        let mut record = MetadataRecord::read_self_record(&mut self.volume, &self.boot)?;
        let fixup_sectors = record.apply_fixup()?;
        tracing::debug!("update sequence restored {} sector tails", fixup_sectors);

        let data_attribute = record.find_data_attribute()?;
        let run_list = data_attribute.run_list(record.as_bytes());
        let extents = decode_run_list(run_list, self.boot.bytes_per_cluster())?;

        tracing::info!(
            "$DATA attribute at record offset {}: logical size {} bytes, {} extents",
            data_attribute.offset,
            data_attribute.logical_size,
            extents.len()
        );

        Ok(MftLayout {
            boot: self.boot,
            data_attribute,
            fixup_sectors,
            run_list_hex: hex::encode(trim_run_list(run_list)),
            extents,
        })
    }
}

/// Cuts the attribute padding after the terminating zero control byte.
fn trim_run_list(run_list: &[u8]) -> &[u8] {
    let mut pos = 0usize;
    while let Some(&header) = run_list.get(pos) {
        if header == 0 {
            return &run_list[..pos + 1];
        }
        pos += 1 + (header & 0x0F) as usize + (header >> 4) as usize;
    }
    run_list
}
