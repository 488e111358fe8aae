//! Central Directory Header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// ZIP64 extended information extra field ID.
pub const EXTRA_FIELD_ZIP64: u16 = 0x0001;

/// Central Directory File Header (without signature).
///
/// Describes a single file entry in the archive's central directory. The
/// 4-byte signature (0x02014b50) is read separately before this struct, and
/// the variable-length file name, extra field, and comment follow it.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct CentralDirectoryHeader {
    /// Version made by
    pub version_made_by: u16,
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
    /// File comment length
    pub file_comment_length: u16,
    /// Disk number where file starts (or 0xffff for ZIP64)
    pub disk_number_start: u16,
    /// Internal file attributes
    pub internal_attrs: u16,
    /// External file attributes
    pub external_attrs: u32,
    /// Relative offset of local file header (or 0xffffffff for ZIP64)
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Central Directory signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];

    /// Central Directory signature as u32.
    pub const SIGNATURE: u32 = 0x02014b50;

    /// General purpose flag bits that matter to the parser.
    pub const FLAG_ENCRYPTED: u16 = 1 << 0;
    pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
    pub const FLAG_PATCHED_DATA: u16 = 1 << 5;
    pub const FLAG_STRONG_ENCRYPTION: u16 = 1 << 6;
    pub const FLAG_UTF8: u16 = 1 << 11;
    pub const FLAG_CD_ENCRYPTED: u16 = 1 << 13;
}
