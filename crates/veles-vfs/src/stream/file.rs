//! OS-file-backed stream.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result, Stream};

/// A stream over an operating system file.
///
/// Cloning opens a fresh descriptor on the same path and seeks it to the
/// current position, so clones never share a file cursor.
pub struct FileStream {
    file: File,
    path: PathBuf,
    readable: bool,
    writable: bool,
}

impl FileStream {
    /// Open a file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            file,
            path,
            readable: true,
            writable: false,
        })
    }

    /// Open a file with explicit read/write/truncate settings.
    ///
    /// Writable streams create the file when it does not exist.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        readable: bool,
        writable: bool,
        truncate: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(readable)
            .write(writable)
            .create(writable)
            .truncate(truncate && writable)
            .open(&path)?;
        Ok(Self {
            file,
            path,
            readable,
            writable,
        })
    }
}

impl Stream for FileStream {
    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        if !self.writable {
            return Err(Error::NotSupported);
        }
        self.file.set_len(len)?;
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        // `Seek` is implemented for `&File`, no cursor change involved.
        Ok((&self.file).stream_position()?)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file.seek(pos)?)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.position()? >= self.len()?)
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.readable {
            return Err(Error::NotSupported);
        }
        Ok(self.file.read(buf)?)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::NotSupported);
        }
        self.file.write_all(buf)?;
        Ok(())
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        // A fresh descriptor, not `try_clone`: duplicated descriptors share
        // the kernel file offset, which would break independent readers.
        let mut clone = FileStream::open_with(&self.path, self.readable, self.writable, false)?;
        let pos = self.position()?;
        clone.seek(SeekFrom::Start(pos))?;
        Ok(Box::new(clone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_clone_has_independent_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello world")
            .unwrap();

        let mut a = FileStream::open(&path).unwrap();
        let mut buf = [0u8; 5];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        let mut b = a.clone_stream().unwrap();
        assert_eq!(b.position().unwrap(), 5);

        // Advancing one cursor must not move the other.
        let mut rest = [0u8; 6];
        b.read_exact(&mut rest).unwrap();
        assert_eq!(&rest, b" world");
        assert_eq!(a.position().unwrap(), 5);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.bin");
        std::fs::write(&path, b"x").unwrap();

        let mut s = FileStream::open(&path).unwrap();
        assert!(matches!(s.write_all(b"y"), Err(Error::NotSupported)));
        assert!(matches!(s.set_len(0), Err(Error::NotSupported)));
    }
}
