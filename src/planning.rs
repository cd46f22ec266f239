//! Turns chained extents into absolute byte ranges, clipped to the
//! attribute's logical size.

use crate::error::{MftError, Result};
use crate::types::{AbsoluteRange, Extent};

/// Plans the byte ranges to copy.
///
/// The ranges add up to exactly `logical_size` when the extents cover it and
/// to less when they do not; nothing is ever padded. Once the logical size is
/// reached the current range is truncated and the remaining extents dropped.
pub fn plan_ranges(
    extents: &[Extent],
    bytes_per_cluster: u64,
    logical_size: u64,
) -> Result<Vec<AbsoluteRange>> {
    let mut ranges = Vec::with_capacity(extents.len());
    let mut cursor: i128 = 0;
    let mut planned: u64 = 0;

    for (index, extent) in extents.iter().enumerate() {
        let remaining = logical_size - planned;
        if remaining == 0 {
            tracing::debug!(
                "logical size reached; dropping {} trailing extents",
                extents.len() - index
            );
            break;
        }

        cursor += extent.relative_cluster_offset as i128 * bytes_per_cluster as i128;
        let start = u64::try_from(cursor).map_err(|_| {
            MftError::MalformedRunList(format!(
                "extent {} starts at byte {}, outside the volume",
                index, cursor
            ))
        })?;

        let length = extent.length_bytes.min(remaining);
        if start.checked_add(length).is_none() {
            return Err(MftError::MalformedRunList(format!(
                "extent {} at byte {} with {} bytes overflows",
                index, start, length
            )));
        }

        if length < extent.length_bytes {
            tracing::debug!(
                "extent {} clipped from {} to {} bytes",
                index,
                extent.length_bytes,
                length
            );
        }

        if length > 0 {
            ranges.push(AbsoluteRange::new(start, length));
        }
        planned += length;
    }

    if planned < logical_size {
        tracing::warn!(
            "extents cover {} of {} logical bytes",
            planned,
            logical_size
        );
    }

    Ok(ranges)
}

/// Total number of bytes the ranges will produce
pub fn planned_bytes(ranges: &[AbsoluteRange]) -> u64 {
    ranges.iter().map(|r| r.length).sum()
}
