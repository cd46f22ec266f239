//! `$MFT` self-record handling
//!
//! The first file record of the table describes the table itself. Its
//! unnamed `$DATA` attribute is non-resident and its run-list maps the whole
//! table onto the volume.

use super::boot_sector::{BootParameters, MAX_RECORD_SIZE};
use crate::error::{MftError, Result};
use crate::io::VolumeSource;
use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

/// File record signature "FILE"
pub const FILE_SIGNATURE: [u8; 4] = *b"FILE";

/// Signature written over records that failed a multi-sector transfer check
pub const BAD_SIGNATURE: [u8; 4] = *b"BAAD";

/// Attribute type code of `$DATA`
pub const DATA_ATTRIBUTE_TYPE: u32 = 0x80;

/// Attribute type code terminating the attribute list
pub const END_OF_ATTRIBUTES: u32 = 0xFFFF_FFFF;

/// The update sequence protects every 512 bytes, whatever the sector size
pub const UPDATE_SEQUENCE_STRIDE: usize = 512;

const USA_OFFSET_FIELD: usize = 4;
const USA_COUNT_FIELD: usize = 6;
const FIRST_ATTRIBUTE_FIELD: usize = 20;
const RECORD_HEADER_LEN: usize = 24;

const ATTR_HEADER_LEN: usize = 8;
const ATTR_NON_RESIDENT_FIELD: usize = 8;
const ATTR_RUN_LIST_OFFSET_FIELD: usize = 32;
const ATTR_LOGICAL_SIZE_FIELD: usize = 48;
const NON_RESIDENT_HEADER_LEN: usize = 56;

/// Location and size of the `$DATA` attribute inside a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataAttribute {
    /// Offset of the attribute header from the start of the record
    pub offset: usize,
    pub total_length: u32,
    /// Offset of the run-list from the start of the attribute
    pub run_list_offset: u16,
    /// Defined length of the attribute's data in bytes
    pub logical_size: u64,
}

impl DataAttribute {
    /// Run-list bytes: from the run-list offset to the end of the attribute.
    pub fn run_list<'a>(&self, record: &'a [u8]) -> &'a [u8] {
        let start = self.offset + self.run_list_offset as usize;
        let end = self.offset + self.total_length as usize;
        &record[start..end]
    }
}

/// A single file record read from the volume
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    data: Vec<u8>,
}

impl MetadataRecord {
    /// Wraps raw record bytes after checking the signature.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() < RECORD_HEADER_LEN {
            return Err(MftError::FormatMismatch(format!(
                "file record too small: {} bytes",
                data.len()
            )));
        }

        let signature = &data[..4];
        if signature == BAD_SIGNATURE {
            return Err(MftError::FormatMismatch(
                "$MFT self-record is marked BAAD (failed multi-sector transfer)".to_string(),
            ));
        }
        if signature != FILE_SIGNATURE {
            return Err(MftError::FormatMismatch(format!(
                "wrong file record signature {:02x?}, expected \"FILE\"",
                signature
            )));
        }

        Ok(Self { data })
    }

    /// Reads the `$MFT` self-record located by the boot sector.
    pub fn read_self_record<V: VolumeSource + ?Sized>(
        volume: &mut V,
        params: &BootParameters,
    ) -> Result<Self> {
        if params.record_size > MAX_RECORD_SIZE {
            return Err(MftError::FormatMismatch(format!(
                "file record size {} exceeds {} bytes",
                params.record_size, MAX_RECORD_SIZE
            )));
        }
        let mut data = vec![0u8; params.record_size as usize];
        volume.read_exact_at(params.mft_offset(), &mut data)?;
        Self::new(data)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn first_attribute_offset(&self) -> u16 {
        LittleEndian::read_u16(&self.data[FIRST_ATTRIBUTE_FIELD..FIRST_ATTRIBUTE_FIELD + 2])
    }

    /// Restores the stride tail bytes saved in the update sequence array.
    ///
    /// Returns the number of 512-byte strides restored. Records without a
    /// usable array are left untouched.
    pub fn apply_fixup(&mut self) -> Result<usize> {
        let usa_offset =
            LittleEndian::read_u16(&self.data[USA_OFFSET_FIELD..USA_OFFSET_FIELD + 2]) as usize;
        let usa_count =
            LittleEndian::read_u16(&self.data[USA_COUNT_FIELD..USA_COUNT_FIELD + 2]) as usize;
        let stride = UPDATE_SEQUENCE_STRIDE;

        if usa_count < 2 || usa_offset + usa_count * 2 > self.data.len() {
            return Ok(0);
        }

        let sequence_number = [self.data[usa_offset], self.data[usa_offset + 1]];
        let mut restored = 0;

        for i in 1..usa_count {
            let sector_end = i * stride;
            if sector_end > self.data.len() {
                break;
            }
            let pos = sector_end - 2;
            let stored = [self.data[pos], self.data[pos + 1]];
            if stored != sequence_number {
                return Err(MftError::FormatMismatch(format!(
                    "update sequence mismatch at stride {}: expected {:02x?}, found {:02x?}",
                    i, sequence_number, stored
                )));
            }
            let saved = usa_offset + i * 2;
            self.data[pos] = self.data[saved];
            self.data[pos + 1] = self.data[saved + 1];
            restored += 1;
        }

        Ok(restored)
    }

    /// Walks the attribute list and returns the `$DATA` attribute.
    pub fn find_data_attribute(&self) -> Result<DataAttribute> {
        walk_attributes(&self.data, self.first_attribute_offset() as usize)
    }
}

/// Walks attribute headers from `first_attribute` until `$DATA` is found.
pub fn walk_attributes(record: &[u8], first_attribute: usize) -> Result<DataAttribute> {
    let mut offset = first_attribute;

    loop {
        let header_end = offset
            .checked_add(ATTR_HEADER_LEN)
            .filter(|&end| end <= record.len())
            .ok_or_else(|| {
                MftError::MalformedAttributeList(format!(
                    "attribute walk left the record at offset {} without finding $DATA",
                    offset
                ))
            })?;

        let type_id = LittleEndian::read_u32(&record[offset..offset + 4]);
        let total_length = LittleEndian::read_u32(&record[offset + 4..header_end]);

        if type_id == END_OF_ATTRIBUTES {
            return Err(MftError::MalformedAttributeList(format!(
                "end of attributes reached at offset {} without finding $DATA",
                offset
            )));
        }

        if total_length == 0 {
            return Err(MftError::MalformedAttributeList(format!(
                "attribute type {:#x} at offset {} declares zero length",
                type_id, offset
            )));
        }

        tracing::trace!(
            "attribute type {:#x} at offset {} ({} bytes)",
            type_id,
            offset,
            total_length
        );

        if type_id == DATA_ATTRIBUTE_TYPE {
            return parse_data_attribute(record, offset, total_length);
        }

        offset = offset.checked_add(total_length as usize).ok_or_else(|| {
            MftError::MalformedAttributeList(format!(
                "attribute length {} at offset {} overflows",
                total_length, offset
            ))
        })?;
    }
}

fn parse_data_attribute(record: &[u8], offset: usize, total_length: u32) -> Result<DataAttribute> {
    let end = offset + total_length as usize;
    if end > record.len() {
        return Err(MftError::MalformedAttributeList(format!(
            "$DATA attribute at offset {} runs {} bytes past the record",
            offset,
            end - record.len()
        )));
    }
    if (total_length as usize) < NON_RESIDENT_HEADER_LEN {
        return Err(MftError::MalformedAttributeList(format!(
            "$DATA attribute at offset {} is too short ({} bytes) for a non-resident header",
            offset, total_length
        )));
    }
    if record[offset + ATTR_NON_RESIDENT_FIELD] == 0 {
        return Err(MftError::MalformedAttributeList(format!(
            "$DATA attribute at offset {} is resident and has no run-list",
            offset
        )));
    }

    let field = offset + ATTR_RUN_LIST_OFFSET_FIELD;
    let run_list_offset = LittleEndian::read_u16(&record[field..field + 2]);
    let field = offset + ATTR_LOGICAL_SIZE_FIELD;
    let logical_size = LittleEndian::read_u64(&record[field..field + 8]);

    if run_list_offset as u32 > total_length {
        return Err(MftError::MalformedAttributeList(format!(
            "run-list offset {} lies outside the {}-byte $DATA attribute",
            run_list_offset, total_length
        )));
    }

    Ok(DataAttribute {
        offset,
        total_length,
        run_list_offset,
        logical_size,
    })
}
