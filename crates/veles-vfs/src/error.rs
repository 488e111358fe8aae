//! Error types for the VFS crate.

use std::io;

use thiserror::Error;

/// Steady-state error type for stream and file system operations.
///
/// Archive parsers carry their own richer construction-time error types and
/// fold into this taxonomy at the [`FileSystem`](crate::FileSystem) boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream or file system does not support the requested capability.
    #[error("operation not supported")]
    NotSupported,

    /// No file or directory exists at the given path.
    #[error("no such file or directory")]
    NotFound,

    /// The path names a file where a directory was required.
    #[error("not a directory")]
    NotADirectory,

    /// The operation is not permitted (e.g. writing to a read-only mount).
    #[error("permission denied")]
    PermissionDenied,

    /// An argument is outside the operation's domain.
    #[error("invalid argument")]
    InvalidArgument,

    /// A position or length exceeds the allowed range.
    #[error("result out of range")]
    OutOfRange,

    /// The stream ended before the requested data could be read.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// An archive entry's password failed verification.
    #[error("bad password")]
    BadPassword,

    /// The compressed payload could not be decoded.
    #[error("decompression error: {0}")]
    Decompress(String),

    /// An archive-level failure surfaced through a file system operation.
    #[error("archive error: {0}")]
    Archive(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl Error {
    /// Whether this error means "the layer does not implement the operation".
    #[inline]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported)
    }

    /// Whether this error means "the path does not exist here".
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound,
            io::ErrorKind::PermissionDenied => Error::PermissionDenied,
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            io::ErrorKind::Unsupported => Error::NotSupported,
            _ => Error::Io(e),
        }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => io::ErrorKind::NotFound.into(),
            Error::PermissionDenied => io::ErrorKind::PermissionDenied.into(),
            Error::UnexpectedEof => io::ErrorKind::UnexpectedEof.into(),
            Error::NotSupported => io::ErrorKind::Unsupported.into(),
            Error::Io(e) => e,
            other => io::Error::other(other),
        }
    }
}

/// Result type alias using the VFS error type.
pub type Result<T> = std::result::Result<T, Error>;
