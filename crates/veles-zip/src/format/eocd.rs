//! End of Central Directory (EOCD) structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// End of Central Directory Record (without signature).
///
/// Found at the end of the archive, possibly followed by a comment. The
/// 4-byte signature (0x06054b50) is read separately before this struct.
/// For ZIP64 archives the fields hold 0xFFFF or 0xFFFFFFFF sentinels and
/// the actual values live in the ZIP64 EOCD record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EocdRecord {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where central directory starts
    pub central_dir_disk: u16,
    /// Number of central directory records on this disk
    pub entry_count_disk: u16,
    /// Total number of central directory records
    pub entry_count_total: u16,
    /// Size of central directory (bytes)
    pub central_dir_size: u32,
    /// Offset of start of central directory, relative to start of archive
    pub central_dir_offset: u32,
    /// Comment length
    pub comment_length: u16,
}

impl EocdRecord {
    /// EOCD signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

    /// EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06054b50;

    /// Check if this archive uses ZIP64 extensions.
    ///
    /// A sentinel in any field means the real value is in the ZIP64 EOCD
    /// record.
    pub fn is_zip64(&self) -> bool {
        self.disk_number == u16::MAX
            || self.central_dir_disk == u16::MAX
            || self.entry_count_disk == u16::MAX
            || self.entry_count_total == u16::MAX
            || self.central_dir_size == u32::MAX
            || self.central_dir_offset == u32::MAX
    }
}

/// ZIP64 End of Central Directory Locator (without signature).
///
/// Sits immediately before the legacy EOCD record and points to the ZIP64
/// EOCD record. The 4-byte signature (0x07064b50) is read separately before
/// this struct.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Locator {
    /// Disk number containing the ZIP64 EOCD record
    pub eocd64_disk: u32,
    /// Offset of the ZIP64 EOCD record
    pub eocd64_offset: u64,
    /// Total number of disks
    pub total_disks: u32,
}

impl Eocd64Locator {
    /// ZIP64 EOCD Locator signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x06, 0x07];

    /// ZIP64 EOCD Locator signature as u32.
    pub const SIGNATURE: u32 = 0x07064b50;

    /// Full size on disk, including the signature.
    pub const SIZE: u64 = 20;
}

/// ZIP64 End of Central Directory Record (without signature).
///
/// The 4-byte signature (0x06064b50) is read separately before this struct.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Record {
    /// Size of this record, not counting the signature or this field
    pub record_size: u64,
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// This disk number
    pub disk_number: u32,
    /// Disk where central directory starts
    pub central_dir_disk: u32,
    /// Number of central directory records on this disk
    pub entry_count_disk: u64,
    /// Total number of central directory records
    pub entry_count_total: u64,
    /// Size of central directory (bytes)
    pub central_dir_size: u64,
    /// Offset of start of central directory
    pub central_dir_offset: u64,
}

impl Eocd64Record {
    /// ZIP64 EOCD signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x06, 0x06];

    /// ZIP64 EOCD signature as u32.
    pub const SIGNATURE: u32 = 0x06064b50;

    /// Bytes not covered by `record_size` (signature plus the size field).
    pub const LEADING_BYTES: u64 = 12;

    /// Fixed record size without the trailing comment.
    pub const SIZE_WITHOUT_COMMENT: u64 = 56;
}
