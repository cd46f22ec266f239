//! NTFS boot sector (BIOS parameter block) decoding
//!
//! Only the fields needed to find the master file table are read: the
//! geometry, the starting cluster of `$MFT` and the size of one file record.

use crate::error::{MftError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Cursor;

/// Filesystem identifier at offset 3 ("NTFS" followed by four spaces)
pub const NTFS_OEM_ID: [u8; 4] = *b"NTFS";

pub const BOOT_SECTOR_OFFSET: u64 = 0;
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Largest file record accepted from the boot sector
pub const MAX_RECORD_SIZE: u32 = 64 * 1024;

const OEM_ID_OFFSET: u64 = 3;
const BYTES_PER_SECTOR_OFFSET: u64 = 11;
const SECTORS_PER_CLUSTER_OFFSET: u64 = 13;
const MFT_LCN_OFFSET: u64 = 48;
const RECORD_SIZE_OFFSET: u64 = 64;

/// Geometry and `$MFT` location read from the boot sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootParameters {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u16,
    /// Logical cluster number of the first `$MFT` record
    pub mft_start_cluster: u64,
    /// Size in bytes of one file record
    pub record_size: u32,
}

fn truncated(e: std::io::Error) -> MftError {
    MftError::FormatMismatch(format!("boot sector truncated: {}", e))
}

impl BootParameters {
    /// Parses the first sector of a volume.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BOOT_SECTOR_SIZE {
            return Err(MftError::FormatMismatch(format!(
                "boot sector too small: {} bytes, need {}",
                data.len(),
                BOOT_SECTOR_SIZE
            )));
        }

        let oem_id = &data[OEM_ID_OFFSET as usize..OEM_ID_OFFSET as usize + 4];
        if oem_id != NTFS_OEM_ID {
            return Err(MftError::FormatMismatch(format!(
                "volume OEM identifier is {:?}, expected \"NTFS\"",
                String::from_utf8_lossy(oem_id)
            )));
        }

        let mut cursor = Cursor::new(data);

        cursor.set_position(BYTES_PER_SECTOR_OFFSET);
        let bytes_per_sector = cursor.read_u16::<LittleEndian>().map_err(truncated)?;

        cursor.set_position(SECTORS_PER_CLUSTER_OFFSET);
        let sectors_per_cluster = cursor.read_u16::<LittleEndian>().map_err(truncated)?;

        cursor.set_position(MFT_LCN_OFFSET);
        let mft_start_cluster = cursor.read_u64::<LittleEndian>().map_err(truncated)?;

        cursor.set_position(RECORD_SIZE_OFFSET);
        let raw_record_size = cursor.read_u8().map_err(truncated)?;

        let bytes_per_cluster = bytes_per_sector as u64 * sectors_per_cluster as u64;
        if bytes_per_cluster == 0 {
            return Err(MftError::FormatMismatch(format!(
                "zero cluster size ({} bytes/sector, {} sectors/cluster)",
                bytes_per_sector, sectors_per_cluster
            )));
        }

        let record_size = decode_record_size(raw_record_size, bytes_per_cluster)?;

        if mft_start_cluster.checked_mul(bytes_per_cluster).is_none() {
            return Err(MftError::FormatMismatch(format!(
                "$MFT start cluster {} lies beyond any addressable byte offset",
                mft_start_cluster
            )));
        }

        Ok(Self {
            bytes_per_sector,
            sectors_per_cluster,
            mft_start_cluster,
            record_size,
        })
    }

    /// Returns the cluster size in bytes
    #[inline]
    pub fn bytes_per_cluster(&self) -> u64 {
        self.bytes_per_sector as u64 * self.sectors_per_cluster as u64
    }

    /// Byte offset of the `$MFT` self-record on the volume
    #[inline]
    pub fn mft_offset(&self) -> u64 {
        self.mft_start_cluster * self.bytes_per_cluster()
    }
}

/// Decodes the one-byte "clusters per file record" field.
///
/// Values up to 0x7F count clusters. Larger values are a negative exponent in
/// single-byte two's complement: 0xF6 is -10, meaning 2^10 bytes.
pub fn decode_record_size(raw: u8, bytes_per_cluster: u64) -> Result<u32> {
    let size = if raw < 0x80 {
        raw as u64 * bytes_per_cluster
    } else {
        let exponent = (raw as i8).unsigned_abs() as u32;
        if exponent >= u32::BITS {
            return Err(MftError::FormatMismatch(format!(
                "record size exponent {} out of range (byte {:#04x})",
                exponent, raw
            )));
        }
        1u64 << exponent
    };

    if size == 0 {
        return Err(MftError::FormatMismatch(
            "file record size decodes to zero".to_string(),
        ));
    }

    if size > MAX_RECORD_SIZE as u64 {
        return Err(MftError::FormatMismatch(format!(
            "file record size {} exceeds {} bytes (byte {:#04x})",
            size, MAX_RECORD_SIZE, raw
        )));
    }

    Ok(size as u32)
}
