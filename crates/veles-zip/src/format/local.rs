//! Local File Header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Local File Header (without signature).
///
/// Precedes the actual file data in the archive. The 4-byte signature
/// (0x04034b50) is read separately before this struct. When skipping over an
/// entry only the two trailing length fields matter; see
/// [`LocalFileHeader::LENGTHS_OFFSET`].
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LocalFileHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// File last modification time (DOS format)
    pub last_mod_time: u16,
    /// File last modification date (DOS format)
    pub last_mod_date: u16,
    /// CRC-32 of uncompressed data
    pub crc32: u32,
    /// Compressed size (or 0xffffffff for ZIP64)
    pub compressed_size: u32,
    /// Uncompressed size (or 0xffffffff for ZIP64)
    pub uncompressed_size: u32,
    /// File name length
    pub file_name_length: u16,
    /// Extra field length
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Local File Header signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

    /// Local File Header signature as u32.
    pub const SIGNATURE: u32 = 0x04034b50;

    /// Full header size on disk, including the signature.
    pub const SIZE: u64 = 30;

    /// Distance from the end of the signature to the name/extra length pair.
    pub const LENGTHS_OFFSET: i64 = (Self::SIZE - 4 - 4) as i64;
}
