//! Volume source trait
//!
//! Every read names its absolute byte offset. No implementation is allowed to
//! depend on a cursor left behind by a previous read.

mod device;

use crate::error::{MftError, Result};

pub use device::{DiskReader, MmapVolume};

/// A readable, byte-addressable volume: a raw device, an image file or a
/// buffer held in memory.
pub trait VolumeSource {
    /// Reads up to `buffer.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read, which is less than `buffer.len()`
    /// only when the end of the volume is reached.
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize>;

    /// Total size of the volume in bytes.
    fn size(&self) -> u64;

    /// Fills `buffer` completely from `offset` or fails with
    /// [`MftError::ShortRead`].
    fn read_exact_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buffer.len() {
            let n = self.read_at(offset + filled as u64, &mut buffer[filled..])?;
            if n == 0 {
                return Err(MftError::ShortRead {
                    offset,
                    expected: buffer.len(),
                    actual: filled,
                });
            }
            filled += n;
        }
        Ok(())
    }
}

impl VolumeSource for [u8] {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        let len = self.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buffer.len().min(self.len() - start);
        buffer[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl VolumeSource for Vec<u8> {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        self.as_mut_slice().read_at(offset, buffer)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl<V: VolumeSource + ?Sized> VolumeSource for &mut V {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buffer)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

impl<V: VolumeSource + ?Sized> VolumeSource for Box<V> {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buffer)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}
