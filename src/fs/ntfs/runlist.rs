//! Run-list (mapping pairs) codec
//!
//! Each record starts with a control byte: the low nibble is the width of the
//! cluster-count field, the high nibble the width of the signed offset field.
//! Offsets chain: each one is relative to the previous extent's first
//! cluster. A zero control byte ends the list.

use crate::error::{MftError, Result};
use crate::types::Extent;

/// Widest field that still fits the 64-bit targets
pub const MAX_FIELD_WIDTH: usize = 8;

/// Decodes a run-list into extents, in list order.
pub fn decode_run_list(bytes: &[u8], bytes_per_cluster: u64) -> Result<Vec<Extent>> {
    let mut extents = Vec::new();
    let mut pos = 0usize;
    let mut lcn: i64 = 0;

    loop {
        let header = *bytes.get(pos).ok_or_else(|| {
            MftError::MalformedRunList(format!(
                "run-list ended after {} bytes without a terminator",
                pos
            ))
        })?;
        pos += 1;

        if header == 0 {
            break;
        }

        let length_width = (header & 0x0F) as usize;
        let offset_width = (header >> 4) as usize;

        if length_width > MAX_FIELD_WIDTH || offset_width > MAX_FIELD_WIDTH {
            return Err(MftError::MalformedRunList(format!(
                "control byte {:#04x} at {} declares a {}-byte length and {}-byte offset",
                header,
                pos - 1,
                length_width,
                offset_width
            )));
        }

        let record_end = pos + length_width + offset_width;
        if record_end > bytes.len() {
            return Err(MftError::MalformedRunList(format!(
                "run record at {} needs {} bytes, only {} remain",
                pos - 1,
                length_width + offset_width,
                bytes.len() - pos
            )));
        }

        let clusters = read_unsigned(&bytes[pos..pos + length_width]);
        pos += length_width;
        let relative = read_signed(&bytes[pos..pos + offset_width]);
        pos += offset_width;

        let length_bytes = clusters.checked_mul(bytes_per_cluster).ok_or_else(|| {
            MftError::MalformedRunList(format!(
                "{} clusters of {} bytes overflow a 64-bit length",
                clusters, bytes_per_cluster
            ))
        })?;

        lcn = lcn.checked_add(relative).ok_or_else(|| {
            MftError::MalformedRunList(format!(
                "cluster offset {} overflows the running position {}",
                relative, lcn
            ))
        })?;

        if offset_width == 0 {
            tracing::warn!(
                "sparse run of {} clusters; offset kept at 0 relative to the previous extent",
                clusters
            );
        }

        tracing::debug!(
            "run {}: {} clusters, relative {:+}, lcn {}",
            extents.len(),
            clusters,
            relative,
            lcn
        );

        extents.push(Extent::new(length_bytes, relative, lcn));
    }

    Ok(extents)
}

/// Zero-extends a little-endian field of up to eight bytes.
#[inline]
pub fn read_unsigned(field: &[u8]) -> u64 {
    field
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Sign-extends a little-endian field of up to eight bytes.
///
/// An empty field reads as zero.
#[inline]
pub fn read_signed(field: &[u8]) -> i64 {
    let Some(&msb) = field.last() else {
        return 0;
    };
    let raw = read_unsigned(field);
    if msb & 0x80 == 0 {
        raw as i64
    } else {
        (raw as i128 - (1i128 << (8 * field.len()))) as i64
    }
}

/// Encodes one run record with explicit field widths.
pub fn encode_run(
    clusters: u64,
    relative: i64,
    length_width: usize,
    offset_width: usize,
) -> Result<Vec<u8>> {
    if length_width > MAX_FIELD_WIDTH || offset_width > MAX_FIELD_WIDTH {
        return Err(MftError::MalformedRunList(format!(
            "field widths {}/{} exceed {} bytes",
            length_width, offset_width, MAX_FIELD_WIDTH
        )));
    }
    if unsigned_width(clusters) > length_width {
        return Err(MftError::MalformedRunList(format!(
            "{} clusters do not fit in {} bytes",
            clusters, length_width
        )));
    }
    if relative != 0 && signed_width(relative) > offset_width {
        return Err(MftError::MalformedRunList(format!(
            "offset {} does not fit in {} bytes",
            relative, offset_width
        )));
    }

    let mut out = Vec::with_capacity(1 + length_width + offset_width);
    out.push(((offset_width as u8) << 4) | length_width as u8);
    out.extend_from_slice(&clusters.to_le_bytes()[..length_width]);
    out.extend_from_slice(&relative.to_le_bytes()[..offset_width]);
    Ok(out)
}

/// Encodes a whole run-list with the narrowest fields, plus the terminator.
///
/// A zero offset is written as an explicit one-byte field rather than as a
/// sparse run.
pub fn encode_run_list(runs: &[(u64, i64)]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for &(clusters, relative) in runs {
        let length_width = unsigned_width(clusters).max(1);
        let offset_width = signed_width(relative);
        out.extend(encode_run(clusters, relative, length_width, offset_width)?);
    }
    out.push(0);
    Ok(out)
}

fn unsigned_width(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()).div_ceil(8) as usize
}

fn signed_width(value: i64) -> usize {
    (1..=MAX_FIELD_WIDTH)
        .find(|&width| {
            let bits = 8 * width as u32;
            bits == i64::BITS || {
                let limit = 1i64 << (bits - 1);
                (-limit..limit).contains(&value)
            }
        })
        .unwrap_or(MAX_FIELD_WIDTH)
}
