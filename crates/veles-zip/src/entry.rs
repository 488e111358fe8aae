//! Archive entry metadata.

use crate::format::CompressionMethod;

/// Encryption schemes an entry can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptMethod {
    /// Not encrypted.
    None,
    /// Traditional PKWARE encryption, verified against the entry CRC.
    ZipCrypto,
    /// Traditional PKWARE encryption, verified against the DOS timestamp
    /// (used when the CRC lives in a data descriptor).
    ZipCrypto2,
}

/// Metadata for one archive entry, resolved from the central directory.
///
/// Sizes and the local header offset are already ZIP64-resolved and corrected
/// for any archive base offset.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    /// File name/path within the archive.
    pub name: String,
    /// Entry comment.
    pub comment: String,
    /// Compression method.
    pub compression: CompressionMethod,
    /// Encryption method.
    pub encryption: EncryptMethod,
    /// Whether the name and comment are flagged as UTF-8.
    pub is_utf8: bool,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Last modification as a Unix timestamp (UTC).
    pub last_modified: i64,
    /// Absolute offset of the local file header.
    pub local_header_offset: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
}

impl ZipEntry {
    /// Whether the entry payload is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encryption != EncryptMethod::None
    }

    /// Whether the entry denotes a directory by ZIP convention.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}
