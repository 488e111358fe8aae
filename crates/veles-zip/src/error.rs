//! Error types for the ZIP crate.

use std::io;

use thiserror::Error;

/// Errors raised while parsing or reading ZIP archives.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not find the end of central directory record.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// The archive ended in the middle of a record.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Invalid end of central directory signature.
    #[error("bad end of central directory signature")]
    BadEocdSignature,

    /// Invalid ZIP64 end of central directory signature.
    #[error("bad ZIP64 end of central directory signature")]
    BadEocd64Signature,

    /// Invalid ZIP64 end of central directory locator signature.
    #[error("bad ZIP64 end of central directory locator signature")]
    BadEocd64LocatorSignature,

    /// The ZIP64 end of central directory record declares an impossible size.
    #[error("bad ZIP64 end of central directory record size")]
    BadEocdSize,

    /// The archive spans multiple disks.
    #[error("multi-disk archives are not supported")]
    MultiDiskNotSupported,

    /// The central directory offset exceeds the supported range.
    #[error("central directory offset too big")]
    CdOffsetTooBig,

    /// The central directory size exceeds the supported range.
    #[error("central directory size too big")]
    CdSizeTooBig,

    /// Invalid central directory file header signature.
    #[error("bad central directory file header signature")]
    BadCdSignature,

    /// The central directory is not located before the end of central
    /// directory record.
    #[error("central directory location invalid")]
    CdLocationInvalid,

    /// Invalid local file header signature.
    #[error("bad local file header signature")]
    BadLocalHeaderSignature,

    /// The entry defers its sizes to a data descriptor.
    #[error("data descriptor entries are not supported")]
    DataDescriptorNotSupported,

    /// The entry uses compressed patched data.
    #[error("compressed patched data is not supported")]
    CompressedPatchedDataNotSupported,

    /// The entry uses strong encryption.
    #[error("strong encryption is not supported")]
    StrongEncryptionNotSupported,

    /// The central directory itself is encrypted.
    #[error("central directory encryption is not supported")]
    CdEncryptionNotSupported,

    /// Unsupported compression method.
    #[error("unsupported compression method: {0}")]
    CompressionMethodNotSupported(u16),

    /// An entry carries a ZIP64 size sentinel in a non-ZIP64 archive.
    #[error("bad central directory entry size")]
    BadCdEntrySize,

    /// A ZIP64 entry is missing its extended information extra field.
    #[error("missing ZIP64 extended information extra field")]
    MissingZip64ExtraField,

    /// The entry's password failed verification.
    #[error("bad password")]
    BadPassword,

    /// Two archive entries resolve to the same path.
    #[error("duplicated file: {0}")]
    DuplicatedFile(String),

    /// An underlying stream or file system failure.
    #[error("{0}")]
    Vfs(veles_vfs::Error),
}

impl From<veles_vfs::Error> for Error {
    fn from(e: veles_vfs::Error) -> Self {
        match e {
            veles_vfs::Error::UnexpectedEof => Error::UnexpectedEndOfStream,
            veles_vfs::Error::BadPassword => Error::BadPassword,
            other => Error::Vfs(other),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::Vfs(e.into())
        }
    }
}

/// Folds archive errors into the VFS taxonomy at the file system boundary.
impl From<Error> for veles_vfs::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Vfs(inner) => inner,
            Error::BadPassword => veles_vfs::Error::BadPassword,
            Error::UnexpectedEndOfStream => veles_vfs::Error::UnexpectedEof,
            other => veles_vfs::Error::Archive(other.to_string()),
        }
    }
}

/// Result type for ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;
