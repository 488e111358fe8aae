//! File system abstraction.
//!
//! A [`FileSystem`] resolves [`Path`]s to directories, file attributes, and
//! [`Stream`]s. Implementations include the OS-backed
//! [`LocalFileSystem`], the archive-backed file systems in higher-level
//! crates, and [`OverlayFileSystem`], which stacks any of them.

mod local;
mod overlay;

pub use local::LocalFileSystem;
pub use overlay::OverlayFileSystem;

use crate::{Path, Result, Stream};

/// What a directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
}

/// Metadata for a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttribute {
    pub file_type: FileType,
    /// Unix timestamp in seconds, 0 when unknown.
    pub last_modified: i64,
    /// Size in bytes, 0 for directories.
    pub size: u64,
}

/// Requested access when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccessMode {
    Read,
    Write,
    ReadWrite,
}

impl FileAccessMode {
    pub fn is_readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Additional open behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Discard existing contents on open. Requires write access.
    pub truncate: bool,
}

/// Iterator over the entries of one directory, yielding each entry name as a
/// single-segment [`Path`].
pub type DirectoryIterator = Box<dyn Iterator<Item = Result<Path>> + Send>;

/// A mountable file system.
///
/// Read-only implementations return [`Error::NotSupported`] from the mutating
/// operations.
///
/// [`Error::NotSupported`]: crate::Error::NotSupported
pub trait FileSystem: Send + Sync {
    /// Create a directory, succeeding if it already exists.
    fn create_directory(&self, path: &Path) -> Result<()>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Rename a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Fetch the attributes of a file or directory.
    fn file_attribute(&self, path: &Path) -> Result<FileAttribute>;

    /// Iterate the entries of a directory.
    fn visit_directory(&self, path: &Path) -> Result<DirectoryIterator>;

    /// Open a file as a stream.
    fn open_file(
        &self,
        path: &Path,
        access: FileAccessMode,
        flags: OpenFlags,
    ) -> Result<Box<dyn Stream>>;
}
