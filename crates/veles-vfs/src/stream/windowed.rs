//! Byte-range window over another stream.

use std::io::SeekFrom;

use crate::{Error, Result, Stream};

/// Restricts an underlying stream to a fixed-length window beginning at the
/// underlying stream's position at construction time.
///
/// Reads truncate at the window end; seeks clamp to `[0, len]` and are always
/// issued to the underlying stream as relative moves, so the window never
/// needs to know its absolute start offset.
pub struct WindowedStream {
    underlay: Box<dyn Stream>,
    max_len: u64,
    len: u64,
    pos: u64,
}

impl WindowedStream {
    /// Wrap `underlay`, windowing the next `len` bytes from its current
    /// position.
    pub fn new(underlay: Box<dyn Stream>, len: u64) -> Self {
        Self {
            underlay,
            max_len: len,
            len,
            pos: 0,
        }
    }
}

impl Stream for WindowedStream {
    fn is_readable(&self) -> bool {
        self.underlay.is_readable()
    }

    fn is_writable(&self) -> bool {
        self.underlay.is_writable()
    }

    fn is_seekable(&self) -> bool {
        self.underlay.is_seekable()
    }

    fn len(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        if len > self.max_len {
            return Err(Error::OutOfRange);
        }
        if len < self.len && self.pos > len {
            // Pull the cursor back inside the shrunken window.
            let shift = self.pos - len;
            self.underlay.seek(SeekFrom::Current(-(shift as i64)))?;
            self.pos = len;
        }
        self.len = len;
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.pos)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        // Fold every origin down to a clamped relative move.
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(offset) => self.pos as i128 + offset as i128,
            SeekFrom::End(offset) => self.len as i128 + offset as i128,
        };
        let target = target.clamp(0, self.len as i128) as u64;

        let delta = target as i64 - self.pos as i64;
        self.underlay.seek(SeekFrom::Current(delta))?;
        self.pos = target;
        Ok(self.pos)
    }

    fn is_eof(&self) -> Result<bool> {
        Ok(self.pos >= self.len)
    }

    fn flush(&mut self) -> Result<()> {
        self.underlay.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rest = (self.len - self.pos).min(buf.len() as u64) as usize;
        let n = self.underlay.read(&mut buf[..rest])?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if (self.len - self.pos) < buf.len() as u64 {
            return Err(Error::OutOfRange);
        }
        self.underlay.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn clone_stream(&self) -> Result<Box<dyn Stream>> {
        // The underlying clone keeps its absolute position, so the window
        // state can be copied verbatim.
        let underlay = self.underlay.clone_stream()?;
        Ok(Box::new(WindowedStream {
            underlay,
            max_len: self.max_len,
            len: self.len,
            pos: self.pos,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStream;

    fn window_over(data: &[u8], skip: u64, len: u64) -> WindowedStream {
        let mut inner = MemoryStream::new(data.to_vec());
        inner.seek(SeekFrom::Start(skip)).unwrap();
        WindowedStream::new(Box::new(inner), len)
    }

    #[test]
    fn test_read_truncates_at_window_end() {
        let mut w = window_over(b"0123456789", 2, 5);
        let mut buf = [0u8; 16];
        assert_eq!(w.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"23456");
        assert!(w.is_eof().unwrap());
        assert_eq!(w.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_clamps_to_bounds() {
        let mut w = window_over(b"0123456789", 2, 5);
        assert_eq!(w.seek(SeekFrom::End(10)).unwrap(), 5);
        assert_eq!(w.seek(SeekFrom::Current(-100)).unwrap(), 0);
        assert_eq!(w.seek(SeekFrom::Start(3)).unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(w.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"56");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut w = window_over(b"0123456789", 2, 5);
        let mut buf = [0u8; 2];
        w.read(&mut buf).unwrap();

        let mut c = w.clone_stream().unwrap();
        assert_eq!(c.position().unwrap(), 2);
        c.read(&mut buf).unwrap();
        assert_eq!(&buf, b"45");
        // Original cursor untouched by the clone's read.
        assert_eq!(w.position().unwrap(), 2);
    }

    #[test]
    fn test_set_len_within_max_only() {
        let mut w = window_over(b"0123456789", 0, 4);
        assert!(matches!(w.set_len(5), Err(Error::OutOfRange)));
        w.seek(SeekFrom::Start(4)).unwrap();
        w.set_len(2).unwrap();
        assert_eq!(w.position().unwrap(), 2);
        assert_eq!(w.len().unwrap(), 2);
    }
}
