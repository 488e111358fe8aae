//! Pull-based raw-DEFLATE decompression stream.

use std::io::SeekFrom;

use flate2::{Decompress, FlushDecompress, Status};

use crate::{Error, Result, Stream};

const CHUNK_SIZE: usize = 16 * 1024;

/// Decompresses a raw deflate payload read from an underlying stream.
///
/// Each `read` moves unconsumed input to the front of the internal chunk
/// buffer, tops it up from the underlying stream, and runs the inflate
/// primitive until the caller's buffer is full or the deflate stream ends.
/// Only forward reads are supported.
pub struct InflateStream {
    underlay: Box<dyn Stream>,
    codec: Decompress,
    chunk: Box<[u8; CHUNK_SIZE]>,
    in_start: usize,
    in_end: usize,
    finished: bool,
    underlay_eof: bool,
    uncompressed_size: Option<u64>,
}

impl InflateStream {
    /// Wrap `underlay`, whose current position is the start of the deflate
    /// payload. `uncompressed_size`, when known, is reported by
    /// [`Stream::len`].
    pub fn new(underlay: Box<dyn Stream>, uncompressed_size: Option<u64>) -> Self {
        Self {
            underlay,
            codec: Decompress::new(false),
            chunk: Box::new([0u8; CHUNK_SIZE]),
            in_start: 0,
            in_end: 0,
            finished: false,
            underlay_eof: false,
            uncompressed_size,
        }
    }

    /// Restart decompression from the beginning of the payload.
    ///
    /// Rebuilds the codec state and re-seeks the underlying stream to its
    /// origin.
    pub fn reset(&mut self) -> Result<()> {
        self.underlay.seek(SeekFrom::Start(0))?;
        self.codec = Decompress::new(false);
        self.in_start = 0;
        self.in_end = 0;
        self.finished = false;
        self.underlay_eof = false;
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        if self.in_start > 0 {
            self.chunk.copy_within(self.in_start..self.in_end, 0);
            self.in_end -= self.in_start;
            self.in_start = 0;
        }
        if !self.underlay_eof && self.in_end < CHUNK_SIZE {
            let fill = CHUNK_SIZE - self.in_end;
            let n = self.underlay.read(&mut self.chunk[self.in_end..])?;
            self.underlay_eof = n < fill;
            self.in_end += n;
        }
        Ok(())
    }
}

impl Stream for InflateStream {
    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn len(&self) -> Result<u64> {
        self.uncompressed_size.ok_or(Error::NotSupported)
    }

    fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn position(&self) -> Result<u64> {
        Ok(self.codec.total_out())
    }

    fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(Error::NotSupported)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.finished)
    }

    fn flush(&mut self) -> Result<()> {
        self.underlay.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || self.finished {
            return Ok(0);
        }

        let mut written = 0;
        loop {
            self.refill()?;

            let before_in = self.codec.total_in();
            let before_out = self.codec.total_out();
            let status = self
                .codec
                .decompress(
                    &self.chunk[self.in_start..self.in_end],
                    &mut buf[written..],
                    FlushDecompress::None,
                )
                .map_err(|e| {
                    tracing::warn!(error = %e, "inflate failed");
                    Error::Decompress(e.to_string())
                })?;
            self.in_start += (self.codec.total_in() - before_in) as usize;
            written += (self.codec.total_out() - before_out) as usize;

            match status {
                Status::StreamEnd => {
                    self.finished = true;
                    break;
                }
                Status::Ok | Status::BufError => {
                    if written == buf.len() {
                        break;
                    }
                    // Output space remains but the input ran dry before the
                    // deflate stream terminator: the payload is truncated.
                    if self.underlay_eof && self.in_start == self.in_end {
                        return Err(Error::Decompress(
                            "deflate stream ended unexpectedly".into(),
                        ));
                    }
                }
            }
        }
        Ok(written)
    }

    fn write_all(&mut self, _buf: &[u8]) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        // The codec state cannot be duplicated, so an equivalent chain is
        // rebuilt from the payload origin and fast-forwarded to the current
        // logical position. Requires a seekable underlying stream.
        let mut underlay = self.underlay.clone_stream()?;
        underlay.seek(SeekFrom::Start(0))?;
        let mut clone = InflateStream::new(underlay, self.uncompressed_size);

        let mut remaining = self.codec.total_out();
        let mut scratch = [0u8; 4096];
        while remaining > 0 {
            let want = remaining.min(scratch.len() as u64) as usize;
            let n = clone.read(&mut scratch[..want])?;
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
            remaining -= n as u64;
        }
        Ok(Box::new(clone))
    }
}
