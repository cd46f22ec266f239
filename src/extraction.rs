use crate::error::Result;
use crate::io::VolumeSource;
use crate::types::{AbsoluteRange, ExtractionSummary};
use sha2::{Digest, Sha256};
use std::io::Write;

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Copies each range, in order, from the volume into `sink`.
///
/// A range that cannot be read in full aborts the copy with
/// [`crate::error::MftError::ShortRead`]; nothing is retried. `progress` receives
/// the bytes copied so far and the bytes planned.
pub fn extract_ranges<V, W>(
    ranges: &[AbsoluteRange],
    volume: &mut V,
    sink: &mut W,
    logical_size: u64,
    chunk_size: usize,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<ExtractionSummary>
where
    V: VolumeSource + ?Sized,
    W: Write + ?Sized,
{
    let planned: u64 = ranges.iter().map(|r| r.length).sum();
    let largest = ranges.iter().map(|r| r.length).max().unwrap_or(0);
    let buffer_len = (chunk_size.max(1) as u64).min(largest) as usize;
    let mut buffer = vec![0u8; buffer_len];

    let mut hasher = Sha256::new();
    let mut extracted = 0u64;

    for range in ranges {
        tracing::debug!("copying {}", range);

        let mut offset = range.start;
        let mut remaining = range.length;

        while remaining > 0 {
            let n = remaining.min(buffer_len as u64) as usize;
            let chunk = &mut buffer[..n];

            volume.read_exact_at(offset, chunk)?;
            sink.write_all(chunk)?;
            hasher.update(&*chunk);

            offset += n as u64;
            remaining -= n as u64;
            extracted += n as u64;

            if let Some(cb) = progress {
                cb(extracted, planned);
            }
        }
    }

    sink.flush()?;

    Ok(ExtractionSummary {
        bytes_extracted: extracted,
        logical_size,
        ranges: ranges.len(),
        sha256: hex::encode(hasher.finalize()),
    })
}
