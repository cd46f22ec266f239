use crate::error::{MftError, Result};
use super::VolumeSource;
use memmap2::Mmap;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

#[cfg(target_os = "linux")]
fn get_block_device_size(file: &File) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    const BLKGETSIZE64: libc::c_ulong = 0x80081272;

    let mut size: u64 = 0;
    let result = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64, &mut size) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(size)
    }
}

#[cfg(not(target_os = "linux"))]
fn get_block_device_size(_file: &File) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Not supported on this platform",
    ))
}

fn open_read_only(path: &Path) -> Result<File> {
    OpenOptions::new().read(true).open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            MftError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "{} - raw volume access needs elevated privileges",
                    path.display()
                ),
            ))
        } else {
            MftError::Io(e)
        }
    })
}

/// Read-only volume backed by a raw device node or an image file.
pub struct DiskReader {
    file: File,
    size: u64,
}

impl DiskReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = open_read_only(path)?;

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{Advice, fadvise};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
        }

        let mut size = file.metadata()?.len();

        if size == 0 {
            if let Ok(device_size) = get_block_device_size(&file) {
                size = device_size;
            }
        }

        if size == 0 {
            if let Ok(end_pos) = file.seek(SeekFrom::End(0)) {
                size = end_pos;
            }
        }

        tracing::debug!("Opened {} ({} bytes)", path.display(), size);

        Ok(Self { file, size })
    }

    #[cfg(unix)]
    fn positional_read(&self, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buffer, offset)
    }

    #[cfg(windows)]
    fn positional_read(&self, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buffer, offset)
    }
}

impl VolumeSource for DiskReader {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        loop {
            match self.positional_read(offset, buffer) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MftError::Io(e)),
            }
        }
    }

    #[inline]
    fn size(&self) -> u64 {
        self.size
    }
}

/// Memory-mapped volume for image files.
///
/// Block devices report a zero length to `mmap`, so they are rejected here
/// and should go through [`DiskReader`] instead.
pub struct MmapVolume {
    mmap: Mmap,
}

impl MmapVolume {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_read_only(path)?;

        if file.metadata()?.len() == 0 {
            return Err(MftError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has zero length and cannot be mapped", path.display()),
            )));
        }

        // The mapping is read-only and the image is not expected to change
        // underneath an acquisition.
        let mmap = unsafe { Mmap::map(&file) }?;

        #[cfg(target_os = "linux")]
        {
            let _ = mmap.advise(memmap2::Advice::Sequential);
        }

        Ok(Self { mmap })
    }

    #[inline]
    pub fn slice_at(&self, offset: u64, length: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(length)?;
        self.mmap.get(start..end)
    }
}

impl VolumeSource for MmapVolume {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        let len = self.mmap.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buffer.len().min(self.mmap.len() - start);
        buffer[..n].copy_from_slice(&self.mmap[start..start + n]);
        Ok(n)
    }

    #[inline]
    fn size(&self) -> u64 {
        self.mmap.len() as u64
    }
}
