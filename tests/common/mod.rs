//! Synthetic NTFS volume builders shared by the test suites

#![allow(dead_code)]

use mftgrab::fs::ntfs::encode_run_list;

pub const BYTES_PER_SECTOR: u16 = 512;
pub const SECTORS_PER_CLUSTER: u16 = 8;
pub const CLUSTER: u64 = 4096;
pub const MFT_CLUSTER: u64 = 4;
pub const MFT_OFFSET: usize = (MFT_CLUSTER * CLUSTER) as usize;
pub const RECORD_SIZE: usize = 1024;
pub const USA_OFFSET: usize = 48;
pub const FIRST_ATTRIBUTE: usize = 56;
pub const SEQUENCE_NUMBER: [u8; 2] = [0x01, 0x00];
pub const UPDATE_STRIDE: usize = 512;

/// Boot sector with the given geometry, `$MFT` cluster and record size byte.
pub fn boot_sector(
    bytes_per_sector: u16,
    sectors_per_cluster: u16,
    mft_lcn: u64,
    record_size_byte: u8,
) -> Vec<u8> {
    let mut sector = vec![0u8; 512];
    sector[0..3].copy_from_slice(&[0xEB, 0x52, 0x90]);
    sector[3..11].copy_from_slice(b"NTFS    ");
    sector[11..13].copy_from_slice(&bytes_per_sector.to_le_bytes());
    sector[13..15].copy_from_slice(&sectors_per_cluster.to_le_bytes());
    sector[48..56].copy_from_slice(&mft_lcn.to_le_bytes());
    sector[64] = record_size_byte;
    sector[510] = 0x55;
    sector[511] = 0xAA;
    sector
}

/// Resident attribute of `len` bytes with an empty body.
pub fn resident_attribute(type_id: u32, len: usize) -> Vec<u8> {
    let mut attr = vec![0u8; len];
    attr[0..4].copy_from_slice(&type_id.to_le_bytes());
    attr[4..8].copy_from_slice(&(len as u32).to_le_bytes());
    attr
}

/// Non-resident `$DATA` attribute carrying `run_list` at offset 64.
pub fn data_attribute(run_list: &[u8], logical_size: u64) -> Vec<u8> {
    let len = (64 + run_list.len()).next_multiple_of(8);
    let mut attr = vec![0u8; len];
    attr[0..4].copy_from_slice(&0x80u32.to_le_bytes());
    attr[4..8].copy_from_slice(&(len as u32).to_le_bytes());
    attr[8] = 1;
    attr[32..34].copy_from_slice(&64u16.to_le_bytes());
    attr[48..56].copy_from_slice(&logical_size.to_le_bytes());
    attr[56..64].copy_from_slice(&logical_size.to_le_bytes());
    attr[64..64 + run_list.len()].copy_from_slice(run_list);
    attr
}

/// Record header and attributes, without the update sequence applied.
pub fn raw_file_record(attributes: &[Vec<u8>]) -> Vec<u8> {
    sized_file_record(RECORD_SIZE, FIRST_ATTRIBUTE, attributes)
}

/// Unprotected record of `size` bytes with attributes from `first_attribute`.
/// The update sequence array holds one entry per 512 bytes.
pub fn sized_file_record(size: usize, first_attribute: usize, attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut record = vec![0u8; size];
    record[0..4].copy_from_slice(b"FILE");
    record[4..6].copy_from_slice(&(USA_OFFSET as u16).to_le_bytes());
    let usa_count = (size / UPDATE_STRIDE + 1) as u16;
    record[6..8].copy_from_slice(&usa_count.to_le_bytes());
    record[20..22].copy_from_slice(&(first_attribute as u16).to_le_bytes());
    record[22..24].copy_from_slice(&1u16.to_le_bytes());

    let mut pos = first_attribute;
    for attr in attributes {
        record[pos..pos + attr.len()].copy_from_slice(attr);
        pos += attr.len();
    }
    record[pos..pos + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    record
}

/// Moves the last two bytes of every 512-byte stride into the update sequence
/// array and stamps the sequence number in their place, as the filesystem
/// does on write.
pub fn protect_record(record: &mut [u8]) {
    let stride = UPDATE_STRIDE;
    record[USA_OFFSET..USA_OFFSET + 2].copy_from_slice(&SEQUENCE_NUMBER);
    for i in 1..=record.len() / stride {
        let tail = i * stride - 2;
        let saved = USA_OFFSET + i * 2;
        record[saved] = record[tail];
        record[saved + 1] = record[tail + 1];
        record[tail..tail + 2].copy_from_slice(&SEQUENCE_NUMBER);
    }
}

/// Self-record as stored on disk.
pub fn file_record(attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut record = raw_file_record(attributes);
    protect_record(&mut record);
    record
}

/// Self-record whose `$DATA` maps `runs` (cluster count, relative offset).
pub fn self_record(runs: &[(u64, i64)], logical_size: u64) -> Vec<u8> {
    let run_list = encode_run_list(runs).unwrap();
    file_record(&[
        resident_attribute(0x10, 0x60),
        resident_attribute(0x30, 0x68),
        data_attribute(&run_list, logical_size),
    ])
}

/// Volume of `clusters` clusters with `$MFT` at cluster 4. Every byte
/// outside the boot sector and self-record is a position-dependent pattern.
pub fn ntfs_image(runs: &[(u64, i64)], logical_size: u64, clusters: u64) -> Vec<u8> {
    ntfs_image_with_record_byte(0xF6, runs, logical_size, clusters)
}

/// Same as [`ntfs_image`] with an explicit record size byte. Only the first
/// 1024 bytes of the self-record are written.
pub fn ntfs_image_with_record_byte(
    record_size_byte: u8,
    runs: &[(u64, i64)],
    logical_size: u64,
    clusters: u64,
) -> Vec<u8> {
    let mut image: Vec<u8> = (0..clusters * CLUSTER)
        .map(|i| ((i / CLUSTER) as u8).wrapping_mul(31) ^ (i as u8))
        .collect();
    image[..512].copy_from_slice(&boot_sector(
        BYTES_PER_SECTOR,
        SECTORS_PER_CLUSTER,
        MFT_CLUSTER,
        record_size_byte,
    ));
    image[MFT_OFFSET..MFT_OFFSET + RECORD_SIZE].copy_from_slice(&self_record(runs, logical_size));
    image
}

/// Concatenation of the given byte ranges of `image`.
pub fn expected_bytes(image: &[u8], ranges: &[(u64, u64)]) -> Vec<u8> {
    ranges
        .iter()
        .flat_map(|&(start, len)| image[start as usize..(start + len) as usize].iter().copied())
        .collect()
}
