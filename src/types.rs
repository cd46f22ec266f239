use serde::Serialize;
use std::fmt;

pub type Offset = u64;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// One contiguous run of clusters backing part of the table.
///
/// `relative_cluster_offset` is measured from the previous extent's starting
/// cluster; `lcn` is the accumulated absolute cluster number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub length_bytes: u64,
    pub relative_cluster_offset: i64,
    pub lcn: i64,
}

impl Extent {
    pub fn new(length_bytes: u64, relative_cluster_offset: i64, lcn: i64) -> Self {
        Self {
            length_bytes,
            relative_cluster_offset,
            lcn,
        }
    }
}

/// A byte range on the volume, ready to be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsoluteRange {
    pub start: Offset,
    pub length: u64,
}

impl AbsoluteRange {
    pub fn new(start: Offset, length: u64) -> Self {
        Self { start, length }
    }

    #[inline]
    pub fn end(&self) -> Offset {
        self.start + self.length
    }
}

impl fmt::Display for AbsoluteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x}..{:#x} ({} bytes)",
            self.start,
            self.end(),
            self.length
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial { shortfall: u64 },
}

/// Outcome of copying the planned ranges into the output sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub bytes_extracted: u64,
    pub logical_size: u64,
    pub ranges: usize,
    pub sha256: String,
}

impl ExtractionSummary {
    pub fn completeness(&self) -> Completeness {
        if self.bytes_extracted >= self.logical_size {
            Completeness::Complete
        } else {
            Completeness::Partial {
                shortfall: self.logical_size - self.bytes_extracted,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completeness() == Completeness::Complete
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
