//! ZIP format structures.
//!
//! This module contains the low-level structures for parsing ZIP archives,
//! including ZIP64 extensions, plus the stream-reading helpers shared by the
//! archive parser.

mod central_dir;
mod eocd;
mod local;

pub use central_dir::{CentralDirectoryHeader, EXTRA_FIELD_ZIP64};
pub use eocd::{Eocd64Locator, Eocd64Record, EocdRecord};
pub use local::LocalFileHeader;

use byteorder::{ReadBytesExt, LE};
use veles_vfs::{Stream, StreamReader};
use zerocopy::{FromBytes, IntoBytes};

use crate::Result;

/// Compression methods accepted in archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionMethod {
    /// No compression (stored).
    Store = 0,
    /// DEFLATE compression.
    Deflate = 8,
}

impl TryFrom<u16> for CompressionMethod {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Store),
            8 => Ok(Self::Deflate),
            other => Err(other),
        }
    }
}

/// Read a packed format struct from the stream's current position.
pub(crate) fn read_struct<T: FromBytes + IntoBytes>(stream: &mut dyn Stream) -> Result<T> {
    let mut value = T::new_zeroed();
    stream.read_exact(value.as_mut_bytes())?;
    Ok(value)
}

pub(crate) fn read_u16(stream: &mut dyn Stream) -> Result<u16> {
    Ok(StreamReader(stream).read_u16::<LE>()?)
}

pub(crate) fn read_u32(stream: &mut dyn Stream) -> Result<u32> {
    Ok(StreamReader(stream).read_u32::<LE>()?)
}

pub(crate) fn read_bytes(stream: &mut dyn Stream, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}
