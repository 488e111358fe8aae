//! Mountable file system over a ZIP archive.

use std::collections::{BTreeMap, VecDeque};

use veles_vfs::{
    DirectoryIterator, FileAccessMode, FileAttribute, FileSystem, FileType, OpenFlags, Path,
    Stream,
};

use crate::archive::ZipArchive;
use crate::entry::ZipEntry;
use crate::{Error, Result};

/// One directory level of the archive's file tree.
#[derive(Default)]
struct DirectoryEntry {
    directories: BTreeMap<String, DirectoryEntry>,
    files: BTreeMap<String, ZipEntry>,
}

enum Located<'a> {
    Directory(&'a DirectoryEntry),
    File(&'a ZipEntry),
}

/// Read-only [`FileSystem`] view of a ZIP archive.
///
/// The whole central directory is indexed into a tree at construction time;
/// lookups afterwards never touch the archive stream. One password applies to
/// every encrypted entry in the mount.
pub struct ZipArchiveFileSystem {
    archive: ZipArchive,
    password: Vec<u8>,
    root: DirectoryEntry,
}

impl ZipArchiveFileSystem {
    /// Index `stream` as a ZIP archive.
    pub fn new(stream: Box<dyn Stream>, password: impl Into<Vec<u8>>) -> Result<Self> {
        let mut archive = ZipArchive::new(stream)?;
        let entries = archive.read_entries()?;
        tracing::debug!(entries = entries.len(), "building archive file tree");

        let mut root = DirectoryEntry::default();
        for entry in entries {
            let path = Path::new(&entry.name);
            if path.is_empty() {
                continue;
            }

            let dir = Self::create_tree(&mut root, &path);
            if entry.is_directory() {
                // Explicit directory marker, nothing to insert.
                let last = path.segment(path.segment_count() - 1).unwrap_or_default();
                if !last.is_empty() && last != "." {
                    dir.directories.entry(last.to_string()).or_default();
                }
                continue;
            }

            let file_name = path.file_name().as_str().to_string();
            if dir.files.contains_key(&file_name) {
                return Err(Error::DuplicatedFile(entry.name));
            }
            dir.files.insert(file_name, entry);
        }

        Ok(Self {
            archive,
            password: password.into(),
            root,
        })
    }

    /// Whether the underlying archive uses ZIP64 extensions.
    pub fn is_zip64(&self) -> bool {
        self.archive.is_zip64()
    }

    /// Walk to the parent directory of `path`, creating levels on demand.
    fn create_tree<'a>(root: &'a mut DirectoryEntry, path: &Path) -> &'a mut DirectoryEntry {
        let mut current = root;
        for i in 0..path.segment_count().saturating_sub(1) {
            let segment = path.segment(i).unwrap_or_default();
            if segment == "." {
                continue;
            }
            current = current
                .directories
                .entry(segment.to_string())
                .or_default();
        }
        current
    }

    fn locate(&self, path: &Path) -> Option<Located<'_>> {
        if path.is_empty() {
            return None;
        }

        let mut entry = &self.root;
        let count = path.segment_count();
        for i in 0..count.saturating_sub(1) {
            let segment = path.segment(i)?;
            if segment == "." {
                continue;
            }
            entry = entry.directories.get(segment)?;
        }

        let file_name = path.segment(count - 1)?;
        if file_name == "." {
            return Some(Located::Directory(entry));
        }
        if let Some(dir) = entry.directories.get(file_name) {
            return Some(Located::Directory(dir));
        }
        entry.files.get(file_name).map(Located::File)
    }
}

impl FileSystem for ZipArchiveFileSystem {
    fn create_directory(&self, _path: &Path) -> veles_vfs::Result<()> {
        Err(veles_vfs::Error::NotSupported)
    }

    fn remove(&self, _path: &Path) -> veles_vfs::Result<()> {
        Err(veles_vfs::Error::NotSupported)
    }

    fn rename(&self, _from: &Path, _to: &Path) -> veles_vfs::Result<()> {
        Err(veles_vfs::Error::NotSupported)
    }

    fn file_attribute(&self, path: &Path) -> veles_vfs::Result<FileAttribute> {
        match self.locate(path) {
            Some(Located::Directory(_)) => Ok(FileAttribute {
                file_type: FileType::Directory,
                last_modified: 0,
                size: 0,
            }),
            Some(Located::File(entry)) => Ok(FileAttribute {
                file_type: FileType::RegularFile,
                last_modified: entry.last_modified,
                size: entry.uncompressed_size,
            }),
            None => Err(veles_vfs::Error::NotFound),
        }
    }

    fn visit_directory(&self, path: &Path) -> veles_vfs::Result<DirectoryIterator> {
        match self.locate(path) {
            Some(Located::Directory(dir)) => {
                // Directories first, then files, both in tree order.
                let names: Vec<veles_vfs::Result<Path>> = dir
                    .directories
                    .keys()
                    .chain(dir.files.keys())
                    .map(|name| Ok(Path::new(name)))
                    .collect();
                Ok(Box::new(names.into_iter()))
            }
            Some(Located::File(_)) => Err(veles_vfs::Error::NotADirectory),
            None => Err(veles_vfs::Error::NotFound),
        }
    }

    fn open_file(
        &self,
        path: &Path,
        access: FileAccessMode,
        flags: OpenFlags,
    ) -> veles_vfs::Result<Box<dyn Stream>> {
        if access.is_writable() {
            return Err(veles_vfs::Error::PermissionDenied);
        }
        if flags.truncate {
            return Err(veles_vfs::Error::InvalidArgument);
        }

        match self.locate(path) {
            Some(Located::File(entry)) => {
                Ok(self.archive.open_entry(entry, &self.password)?)
            }
            Some(Located::Directory(_)) => Err(veles_vfs::Error::InvalidArgument),
            None => Err(veles_vfs::Error::NotFound),
        }
    }
}

impl std::fmt::Debug for ZipArchiveFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchiveFileSystem")
            .field("archive", &self.archive)
            .finish()
    }
}

impl Drop for ZipArchiveFileSystem {
    fn drop(&mut self) {
        // Flatten the tree iteratively; dropping a deep tree through the
        // default recursive drop could exhaust the stack.
        let mut queue: VecDeque<DirectoryEntry> = VecDeque::new();
        queue.push_back(std::mem::take(&mut self.root));
        while let Some(mut dir) = queue.pop_front() {
            for (_, child) in std::mem::take(&mut dir.directories) {
                queue.push_back(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ArchiveBuilder;
    use veles_vfs::MemoryStream;

    fn mount(bytes: Vec<u8>) -> ZipArchiveFileSystem {
        ZipArchiveFileSystem::new(Box::new(MemoryStream::from(bytes)), "").unwrap()
    }

    fn sample() -> ZipArchiveFileSystem {
        mount(
            ArchiveBuilder::new()
                .stored("readme.txt", b"hi")
                .stored("assets/sprite.png", b"PNG..")
                .stored("assets/music/theme.ogg", b"OGG...")
                .build(),
        )
    }

    fn read_all(fs: &dyn FileSystem, path: &str) -> Vec<u8> {
        let mut s = fs
            .open_file(
                &Path::new(path),
                FileAccessMode::Read,
                OpenFlags::default(),
            )
            .unwrap();
        let mut out = vec![0u8; s.len().unwrap() as usize];
        s.read_exact(&mut out).unwrap();
        out
    }

    #[test]
    fn test_attributes() {
        let fs = sample();

        let file = fs.file_attribute(&Path::new("assets/sprite.png")).unwrap();
        assert_eq!(file.file_type, FileType::RegularFile);
        assert_eq!(file.size, 5);
        assert!(file.last_modified > 0);

        let dir = fs.file_attribute(&Path::new("assets/music")).unwrap();
        assert_eq!(dir.file_type, FileType::Directory);

        assert!(matches!(
            fs.file_attribute(&Path::new("assets/missing")),
            Err(veles_vfs::Error::NotFound)
        ));
    }

    #[test]
    fn test_open_and_read() {
        let fs = sample();
        assert_eq!(read_all(&fs, "readme.txt"), b"hi");
        assert_eq!(read_all(&fs, "assets/music/theme.ogg"), b"OGG...");
    }

    #[test]
    fn test_visit_directory_order() {
        let fs = sample();
        let names: Vec<String> = fs
            .visit_directory(&Path::new("assets"))
            .unwrap()
            .map(|p| p.unwrap().as_str().to_string())
            .collect();
        // Subdirectories come before files.
        assert_eq!(names, ["music", "sprite.png"]);
    }

    #[test]
    fn test_dot_resolves_to_directory() {
        let fs = sample();
        let root = fs.file_attribute(&Path::new(".")).unwrap();
        assert_eq!(root.file_type, FileType::Directory);

        let names: Vec<String> = fs
            .visit_directory(&Path::new("."))
            .unwrap()
            .map(|p| p.unwrap().as_str().to_string())
            .collect();
        assert_eq!(names, ["assets", "readme.txt"]);
    }

    #[test]
    fn test_write_access_is_rejected() {
        let fs = sample();
        assert!(matches!(
            fs.open_file(
                &Path::new("readme.txt"),
                FileAccessMode::Write,
                OpenFlags::default()
            ),
            Err(veles_vfs::Error::PermissionDenied)
        ));
        assert!(matches!(
            fs.open_file(
                &Path::new("readme.txt"),
                FileAccessMode::Read,
                OpenFlags { truncate: true }
            ),
            Err(veles_vfs::Error::InvalidArgument)
        ));
        assert!(matches!(
            fs.create_directory(&Path::new("new")),
            Err(veles_vfs::Error::NotSupported)
        ));
    }

    #[test]
    fn test_zip64_attribute_reports_recovered_size() {
        let fs = mount(
            ArchiveBuilder::new()
                .stored("big.bin", b"0123456789abcdef")
                .build_zip64(),
        );
        assert!(fs.is_zip64());

        // The sizes live in the ZIP64 extra field; the attribute surface must
        // report the recovered 64-bit value.
        let attr = fs.file_attribute(&Path::new("big.bin")).unwrap();
        assert_eq!(attr.file_type, FileType::RegularFile);
        assert_eq!(attr.size, 16);
    }

    #[test]
    fn test_duplicate_entries_fail_to_mount() {
        let bytes = ArchiveBuilder::new()
            .stored("dup.txt", b"one")
            .stored("dup.txt", b"two")
            .build();
        let err = ZipArchiveFileSystem::new(Box::new(MemoryStream::from(bytes)), "").unwrap_err();
        assert!(matches!(err, Error::DuplicatedFile(_)));
    }

    #[test]
    fn test_encrypted_mount_uses_password() {
        let bytes = ArchiveBuilder::new()
            .stored_encrypted("secret.bin", b"classified", b"sesame")
            .build();
        let fs =
            ZipArchiveFileSystem::new(Box::new(MemoryStream::from(bytes)), "sesame").unwrap();
        assert_eq!(read_all(&fs, "secret.bin"), b"classified");
    }
}
