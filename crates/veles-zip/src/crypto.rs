//! Traditional PKWARE ("ZipCrypto") decryption.
//!
//! The cipher keeps three 32-bit keys that evolve with every plaintext byte.
//! Each encrypted payload starts with a 12-byte header whose last byte doubles
//! as a cheap password check before any data is decrypted.

use std::io::SeekFrom;

use veles_vfs::Stream;

use crate::{Error, Result};

/// Size of the encryption header preceding the payload.
pub const PK_HEADER_SIZE: u64 = 12;

/// Verifier derived from the entry's CRC-32, used by classic entries.
pub fn pk_verifier(crc32: u32) -> u16 {
    (((crc32 >> 16) & 0xFF) << 8 | ((crc32 >> 24) & 0xFF)) as u16
}

/// Verifier derived from the entry's DOS timestamp, used when the entry
/// defers its CRC to a data descriptor.
pub fn pk_verifier2(dos_time: u16, dos_date: u16) -> u16 {
    ((dos_date & 0xFF) << 8) | ((dos_time >> 8) & 0xFF)
}

fn crc32_byte(crc: u32, byte: u8) -> u32 {
    // The key schedule wants the raw table update; crc32fast exposes the
    // zlib-style continuation, so invert around it.
    let mut hasher = crc32fast::Hasher::new_with_initial(!crc);
    hasher.update(&[byte]);
    !hasher.finalize()
}

/// The evolving ZipCrypto key state.
#[derive(Clone)]
struct PkKeys([u32; 3]);

impl PkKeys {
    fn new(password: &[u8]) -> Self {
        let mut keys = Self([305419896, 591751049, 878082192]);
        for &b in password {
            keys.update(b);
        }
        keys
    }

    fn update(&mut self, plain: u8) {
        self.0[0] = crc32_byte(self.0[0], plain);
        self.0[1] = self.0[1]
            .wrapping_add(self.0[0] & 0xFF)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.0[2] = crc32_byte(self.0[2], (self.0[1] >> 24) as u8);
    }

    fn decode_byte(&mut self, cipher: u8) -> u8 {
        let t = self.0[2] | 2;
        let keystream = ((t.wrapping_mul(t ^ 1)) >> 8) as u8;
        let plain = cipher ^ keystream;
        self.update(plain);
        plain
    }

    #[cfg(test)]
    fn encode_byte(&mut self, plain: u8) -> u8 {
        let t = self.0[2] | 2;
        let keystream = ((t.wrapping_mul(t ^ 1)) >> 8) as u8;
        self.update(plain);
        plain ^ keystream
    }
}

/// Decrypting read-through stream for ZipCrypto entries.
///
/// The constructor consumes and validates the 12-byte encryption header, so a
/// freshly built stream is positioned at the first payload byte. The cipher
/// state only moves forward; the one supported seek is a rewind to the
/// origin, which re-derives the keys and re-consumes the header. Cloning
/// copies the key state along with an independent clone of the underlying
/// stream.
pub struct PkDecryptStream {
    underlay: Box<dyn Stream>,
    password: Vec<u8>,
    verify: u16,
    keys: PkKeys,
    read_count: u64,
}

impl PkDecryptStream {
    /// Wrap `underlay`, positioned at the start of the encryption header.
    ///
    /// `verify` is the expected check value for this entry; only its low byte
    /// participates. A zero check byte in the decoded header is tolerated
    /// since some writers leave it blank.
    pub fn new(underlay: Box<dyn Stream>, password: &[u8], verify: u16) -> Result<Self> {
        let mut stream = Self {
            underlay,
            password: password.to_vec(),
            verify,
            keys: PkKeys::new(password),
            read_count: 0,
        };
        stream.consume_header()?;
        Ok(stream)
    }

    /// Initialize the keys from the password and decode the 12-byte header at
    /// the underlying stream's current position.
    fn consume_header(&mut self) -> Result<()> {
        self.keys = PkKeys::new(&self.password);
        self.read_count = 0;

        let mut header = [0u8; PK_HEADER_SIZE as usize];
        self.underlay.read_exact(&mut header)?;
        for b in &mut header {
            *b = self.keys.decode_byte(*b);
        }

        let check = header[PK_HEADER_SIZE as usize - 1];
        if check != 0 && check != (self.verify & 0xFF) as u8 {
            return Err(Error::BadPassword);
        }
        Ok(())
    }
}

impl Stream for PkDecryptStream {
    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn len(&self) -> veles_vfs::Result<u64> {
        Ok(self.underlay.len()?.saturating_sub(PK_HEADER_SIZE))
    }

    fn set_len(&mut self, _len: u64) -> veles_vfs::Result<()> {
        Err(veles_vfs::Error::NotSupported)
    }

    fn position(&self) -> veles_vfs::Result<u64> {
        Ok(self.read_count)
    }

    fn seek(&mut self, pos: SeekFrom) -> veles_vfs::Result<u64> {
        // The cipher state cannot jump, but a rewind to the origin can be
        // replayed from scratch. Anything else is unsupported.
        match pos {
            SeekFrom::Start(0) => {
                self.underlay.seek(SeekFrom::Start(0))?;
                self.consume_header()?;
                Ok(0)
            }
            _ => Err(veles_vfs::Error::NotSupported),
        }
    }

    fn is_eof(&self) -> veles_vfs::Result<bool> {
        self.underlay.is_eof()
    }

    fn flush(&mut self) -> veles_vfs::Result<()> {
        self.underlay.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> veles_vfs::Result<usize> {
        let n = self.underlay.read(buf)?;
        for b in &mut buf[..n] {
            *b = self.keys.decode_byte(*b);
        }
        self.read_count += n as u64;
        Ok(n)
    }

    fn write_all(&mut self, _buf: &[u8]) -> veles_vfs::Result<()> {
        Err(veles_vfs::Error::NotSupported)
    }

    fn clone_stream(&self) -> veles_vfs::Result<Box<dyn Stream>> {
        Ok(Box::new(PkDecryptStream {
            underlay: self.underlay.clone_stream()?,
            password: self.password.clone(),
            verify: self.verify,
            keys: self.keys.clone(),
            read_count: self.read_count,
        }))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Encrypt `data` the way a ZIP writer would: a random-ish header whose
    /// last byte is the verifier check byte, followed by the payload.
    pub fn encrypt(password: &[u8], verify: u16, data: &[u8]) -> Vec<u8> {
        let mut keys = PkKeys::new(password);
        let mut out = Vec::with_capacity(data.len() + PK_HEADER_SIZE as usize);

        let mut header = [0u8; PK_HEADER_SIZE as usize];
        for (i, b) in header.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        header[PK_HEADER_SIZE as usize - 1] = (verify & 0xFF) as u8;

        for &b in &header {
            out.push(keys.encode_byte(b));
        }
        for &b in data {
            out.push(keys.encode_byte(b));
        }
        out
    }
}
