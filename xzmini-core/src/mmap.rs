//! Memory-mapped input files.
//!
//! [`MappedSource`] exposes a read-only mapping of a file as a
//! [`ByteSource`], so a large compressed file can be streamed through the
//! staging buffers without reading it into memory first.
//!
//! # Example
//!
//! ```no_run
//! use xzmini_core::mmap::MappedSource;
//! use xzmini_core::transfer::ByteSource;
//!
//! let source = MappedSource::open("data.xz")?;
//! let mut magic = [0u8; 6];
//! source.read_at(0, &mut magic);
//! # Ok::<(), xzmini_core::error::XzError>(())
//! ```
//!
//! # Safety
//!
//! The mapping is read-only. If another process truncates or rewrites the
//! file while it is mapped, reads may observe the change or fault.

use crate::error::Result;
use crate::transfer::{ByteSource, stage_in};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A read-only memory-mapped file used as a byte source.
#[derive(Debug)]
pub struct MappedSource {
    mmap: Mmap,
}

impl MappedSource {
    /// Open and map the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::XzError::Io`] if the file cannot be opened or
    /// mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already-open file.
    pub fn from_file(file: &File) -> Result<Self> {
        // SAFETY: the mapping is read-only; concurrent modification of the
        // file is the caller's responsibility.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap })
    }

    /// Mapped length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the mapped file is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The whole mapping as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl ByteSource for MappedSource {
    fn total_len(&self) -> usize {
        self.len()
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        stage_in(dst, &self.mmap, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn create_test_file(name: &str, data: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("xzmini_mmap_test_{}", name));
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(data).expect("write temp file");
        file.sync_all().expect("sync temp file");
        path
    }

    #[test]
    fn test_open_and_read_at() {
        let path = create_test_file("read_at", b"0123456789");
        let source = MappedSource::open(&path).expect("map file");

        assert_eq!(source.total_len(), 10);
        let mut buf = [0u8; 4];
        assert_eq!(source.read_at(8, &mut buf), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(source.read_at(10, &mut buf), 0);
        assert_eq!(source.as_slice(), b"0123456789");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_file_not_found() {
        let path = std::env::temp_dir().join("xzmini_mmap_test_does_not_exist");
        let result = MappedSource::open(path);
        assert!(matches!(result, Err(crate::error::XzError::Io(_))));
    }
}
