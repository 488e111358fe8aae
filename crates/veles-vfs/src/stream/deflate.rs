//! Push-based raw-DEFLATE compression stream.

use std::io::SeekFrom;

use flate2::{Compress, Compression, FlushCompress, Status};

use crate::{Error, Result, Stream};

const CHUNK_SIZE: usize = 16 * 1024;

/// Compresses everything written to it and forwards the raw deflate bytes to
/// an underlying stream.
///
/// The deflate terminator is only emitted by [`DeflateStream::finish`]; until
/// then the compressed output is incomplete. Dropping the stream finishes it
/// implicitly, but errors raised at that point can only be logged, so callers
/// that care should call `finish` themselves.
pub struct DeflateStream {
    underlay: Option<Box<dyn Stream>>,
    codec: Compress,
    chunk: Box<[u8; CHUNK_SIZE]>,
    finished: bool,
}

impl DeflateStream {
    /// Wrap `underlay` as the compressed-byte sink, using the default
    /// compression level.
    pub fn new(underlay: Box<dyn Stream>) -> Self {
        Self::with_level(underlay, Compression::default())
    }

    /// Wrap `underlay` with an explicit compression level.
    pub fn with_level(underlay: Box<dyn Stream>, level: Compression) -> Self {
        Self {
            underlay: Some(underlay),
            codec: Compress::new(level, false),
            chunk: Box::new([0u8; CHUNK_SIZE]),
            finished: false,
        }
    }

    fn underlay(&mut self) -> &mut dyn Stream {
        // Only `into_inner` takes the underlay, and it consumes `self`.
        self.underlay.as_mut().expect("underlay taken").as_mut()
    }

    /// Flush the remaining codec state and write the deflate terminator.
    ///
    /// Idempotent; subsequent calls are no-ops.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        loop {
            let before_out = self.codec.total_out();
            let status = self
                .codec
                .compress(&[], &mut self.chunk[..], FlushCompress::Finish)
                .map_err(|e| Error::Decompress(e.to_string()))?;
            let produced = (self.codec.total_out() - before_out) as usize;
            if produced > 0 {
                let data: Vec<u8> = self.chunk[..produced].to_vec();
                self.underlay().write_all(&data)?;
            }
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {}
            }
        }
        self.finished = true;
        self.underlay().flush()
    }

    /// Finish the compressed stream and return the underlying sink.
    pub fn into_inner(mut self) -> Result<Box<dyn Stream>> {
        self.finish()?;
        Ok(self.underlay.take().expect("underlay taken"))
    }
}

impl Drop for DeflateStream {
    fn drop(&mut self) {
        if self.underlay.is_some() && !self.finished {
            if let Err(e) = self.finish() {
                tracing::warn!(error = %e, "deflate finish failed on drop");
            }
        }
    }
}

impl Stream for DeflateStream {
    fn is_readable(&self) -> bool {
        false
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn len(&self) -> Result<u64> {
        Err(Error::NotSupported)
    }

    fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn position(&self) -> Result<u64> {
        Ok(self.codec.total_in())
    }

    fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(Error::NotSupported)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.finished)
    }

    fn flush(&mut self) -> Result<()> {
        self.underlay().flush()
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::NotSupported)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if self.finished {
            return Err(Error::NotSupported);
        }
        let mut consumed = 0;
        while consumed < buf.len() {
            let before_in = self.codec.total_in();
            let before_out = self.codec.total_out();
            self.codec
                .compress(&buf[consumed..], &mut self.chunk[..], FlushCompress::None)
                .map_err(|e| Error::Decompress(e.to_string()))?;
            consumed += (self.codec.total_in() - before_in) as usize;
            let produced = (self.codec.total_out() - before_out) as usize;
            if produced > 0 {
                let data: Vec<u8> = self.chunk[..produced].to_vec();
                self.underlay().write_all(&data)?;
            }
        }
        Ok(())
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        Err(Error::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferStream, InflateStream};

    fn inflate_all(mut s: Box<dyn Stream>, expected_len: usize) -> Vec<u8> {
        s.seek(SeekFrom::Start(0)).unwrap();
        let mut inflate = InflateStream::new(s, Some(expected_len as u64));
        let mut out = vec![0u8; expected_len];
        inflate.read_exact(&mut out).unwrap();
        assert!(inflate.read(&mut [0u8; 1]).unwrap() == 0 || inflate.is_eof().unwrap());
        out
    }

    #[test]
    fn test_roundtrip_through_inflate() {
        let original: Vec<u8> = (0..80_000u32).map(|i| (i % 13) as u8).collect();

        let mut deflate = DeflateStream::new(Box::new(BufferStream::new()));
        for piece in original.chunks(7001) {
            deflate.write_all(piece).unwrap();
        }
        assert_eq!(deflate.position().unwrap(), original.len() as u64);

        let sink = deflate.into_inner().unwrap();
        assert_eq!(inflate_all(sink, original.len()), original);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut deflate = DeflateStream::new(Box::new(BufferStream::new()));
        deflate.write_all(b"payload").unwrap();
        deflate.finish().unwrap();
        deflate.finish().unwrap();
        assert!(deflate.is_eof().unwrap());
        assert!(matches!(
            deflate.write_all(b"more"),
            Err(Error::NotSupported)
        ));
    }
}
