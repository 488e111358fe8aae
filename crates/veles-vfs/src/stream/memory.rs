//! In-memory streams.

use std::io::SeekFrom;
use std::sync::Arc;

use crate::{Error, Result, Stream};

fn apply_seek(pos: u64, len: u64, seek: SeekFrom) -> Result<u64> {
    let target = match seek {
        SeekFrom::Start(offset) => offset as i128,
        SeekFrom::Current(offset) => pos as i128 + offset as i128,
        SeekFrom::End(offset) => len as i128 + offset as i128,
    };
    if target < 0 || target > u64::MAX as i128 {
        return Err(Error::OutOfRange);
    }
    Ok(target as u64)
}

/// Read-only stream over shared immutable bytes.
///
/// Clones share the underlying buffer, so cloning is cheap and every clone
/// has its own cursor.
pub struct MemoryStream {
    data: Arc<[u8]>,
    pos: u64,
}

impl MemoryStream {
    /// Wrap a byte buffer.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl Stream for MemoryStream {
    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn len(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn position(&self) -> Result<u64> {
        Ok(self.pos)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.pos = apply_seek(self.pos, self.data.len() as u64, pos)?;
        Ok(self.pos)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.pos >= self.data.len() as u64)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = (self.pos as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, _buf: &[u8]) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        Ok(Box::new(MemoryStream {
            data: Arc::clone(&self.data),
            pos: self.pos,
        }))
    }
}

/// Growable read/write stream over an owned byte buffer.
///
/// Used as the sink for [`DeflateStream`](crate::DeflateStream) and as a
/// scratch target in tests; cloning is not supported because the buffer is
/// exclusively owned.
#[derive(Default)]
pub struct BufferStream {
    data: Vec<u8>,
    pos: u64,
}

impl BufferStream {
    /// Create an empty buffer stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing bytes, cursor at the start.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Consume the stream and return the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Stream for BufferStream {
    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn len(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.data.resize(len as usize, 0);
        self.pos = self.pos.min(len);
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.pos)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.pos = apply_seek(self.pos, self.data.len() as u64, pos)?;
        Ok(self.pos)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.pos >= self.data.len() as u64)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = (self.pos as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let start = self.pos as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(())
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        Err(Error::NotSupported)
    }
}
