//! Virtual file system core for Veles.
//!
//! This crate provides the foundational abstractions the rest of Veles mounts
//! things on:
//!
//! - [`Path`] - Immutable virtual paths with zero-copy segment views
//! - [`Stream`] - Capability-style byte streams ([`FileStream`],
//!   [`MemoryStream`], [`WindowedStream`], [`InflateStream`],
//!   [`DeflateStream`])
//! - [`FileSystem`] - Mountable file systems ([`LocalFileSystem`],
//!   [`OverlayFileSystem`])
//!
//! Archive-backed file systems live in higher-level crates and plug into the
//! same traits.

mod error;
mod path;

pub mod filesystem;
pub mod stream;

pub use error::{Error, Result};
pub use filesystem::{
    DirectoryIterator, FileAccessMode, FileAttribute, FileSystem, FileType, LocalFileSystem,
    OpenFlags, OverlayFileSystem,
};
pub use path::Path;
pub use stream::{
    BufferStream, DeflateStream, FileStream, InflateStream, MemoryStream, SeekFrom, Stream,
    StreamReader, WindowedStream,
};
