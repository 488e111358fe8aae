//! Stream abstraction and the composable stream implementations.
//!
//! Everything that produces or consumes bytes in the VFS goes through the
//! [`Stream`] trait: OS files, in-memory buffers, byte-range windows, and the
//! deflate/inflate codecs. Streams compose by exclusive ownership - each layer
//! owns the stream beneath it - and concurrency is achieved by cloning: a
//! cloned stream has its own cursor and codec state and shares no mutable
//! state with the original.

mod deflate;
mod file;
mod inflate;
mod memory;
mod windowed;

pub use deflate::DeflateStream;
pub use file::FileStream;
pub use inflate::InflateStream;
pub use memory::{BufferStream, MemoryStream};
pub use windowed::WindowedStream;

use std::io;
pub use std::io::SeekFrom;

use crate::{Error, Result};

/// Capability-style stream interface.
///
/// Implementations report their capabilities via the `is_*` methods; invoking
/// an unsupported operation returns [`Error::NotSupported`] rather than
/// silently doing nothing. [`Stream::clone_stream`] must produce a fully
/// independent stream: own cursor, own codec/cipher state, own OS handle.
pub trait Stream: Send + Sync {
    /// Whether the stream supports reading.
    fn is_readable(&self) -> bool;

    /// Whether the stream supports writing.
    fn is_writable(&self) -> bool;

    /// Whether the stream supports seeking.
    fn is_seekable(&self) -> bool;

    /// Total length in bytes.
    fn len(&self) -> Result<u64>;

    /// Resize the stream.
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Current cursor position.
    fn position(&self) -> Result<u64>;

    /// Move the cursor, returning the new position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Whether the read cursor has reached the end.
    ///
    /// Writes may extend some streams, so EOF does not mean the stream cannot
    /// grow further.
    fn is_eof(&self) -> Result<bool>;

    /// Flush buffered data down to the backing device.
    fn flush(&mut self) -> Result<()>;

    /// Read up to `buf.len()` bytes, returning the number of bytes read.
    ///
    /// Returns 0 only at true EOF when `buf` is non-empty.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Create an independent stream over the same data.
    fn clone_stream(&self) -> Result<Box<dyn Stream>>;

    /// Read exactly `buf.len()` bytes or fail with
    /// [`Error::UnexpectedEof`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
            filled += n;
        }
        Ok(())
    }
}

/// Adapter exposing a [`Stream`] as [`std::io::Read`], for use with
/// byte-order readers and other `io`-based consumers.
pub struct StreamReader<'a>(pub &'a mut dyn Stream);

impl io::Read for StreamReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(io::Error::from)
    }
}
