//! ZIP archive support for the Veles virtual file system.
//!
//! This crate parses ZIP and ZIP64 archives from any seekable
//! [`Stream`](veles_vfs::Stream) and mounts them as read-only file systems:
//!
//! - [`ZipArchive`] - Central directory parser and entry opener
//! - [`ZipEntry`] - Resolved entry metadata
//! - [`ZipArchiveFileSystem`] - [`FileSystem`](veles_vfs::FileSystem) over an
//!   archive
//!
//! Entry streams are composed from the VFS building blocks: a byte-range
//! window over the archive, optional ZipCrypto decryption, and optional
//! inflate.

mod archive;
mod crypto;
mod dostime;
mod entry;
mod error;
mod format;
mod fs;

#[cfg(test)]
mod testutil;

pub use archive::ZipArchive;
pub use crypto::PkDecryptStream;
pub use dostime::{dos_to_unix, unix_to_dos};
pub use entry::{EncryptMethod, ZipEntry};
pub use error::{Error, Result};
pub use format::CompressionMethod;
pub use fs::ZipArchiveFileSystem;
