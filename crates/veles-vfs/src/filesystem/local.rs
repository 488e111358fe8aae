//! File system over a directory of the host OS.

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use crate::stream::FileStream;
use crate::{Error, Path, Result, Stream};

use super::{
    DirectoryIterator, FileAccessMode, FileAttribute, FileSystem, FileType, OpenFlags,
};

/// Exposes a host directory as a [`FileSystem`].
///
/// Virtual paths are resolved segment by segment below the base directory, so
/// a normalized virtual path can never escape it.
pub struct LocalFileSystem {
    base: PathBuf,
}

impl LocalFileSystem {
    /// Mount `base` as the file system root.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let mut out = self.base.clone();
        for segment in path.segments() {
            out.push(segment);
        }
        out
    }
}

fn attribute_from_metadata(meta: &std::fs::Metadata) -> FileAttribute {
    let last_modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    if meta.is_dir() {
        FileAttribute {
            file_type: FileType::Directory,
            last_modified,
            size: 0,
        }
    } else {
        FileAttribute {
            file_type: FileType::RegularFile,
            last_modified,
            size: meta.len(),
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn create_directory(&self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        match std::fs::create_dir(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if target.is_dir() {
                    Ok(())
                } else {
                    Err(Error::NotADirectory)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        let meta = std::fs::metadata(&target)?;
        if meta.is_dir() {
            std::fs::remove_dir(&target)?;
        } else {
            std::fs::remove_file(&target)?;
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(self.resolve(from), self.resolve(to))?;
        Ok(())
    }

    fn file_attribute(&self, path: &Path) -> Result<FileAttribute> {
        let meta = std::fs::metadata(self.resolve(path))?;
        Ok(attribute_from_metadata(&meta))
    }

    fn visit_directory(&self, path: &Path) -> Result<DirectoryIterator> {
        let target = self.resolve(path);
        if !target.is_dir() {
            return Err(if target.exists() {
                Error::NotADirectory
            } else {
                Error::NotFound
            });
        }
        // Snapshot the listing so the iterator owns no OS handle.
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&target)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(Ok(Path::new(&name))),
                Err(_) => names.push(Err(Error::InvalidArgument)),
            }
        }
        Ok(Box::new(names.into_iter()))
    }

    fn open_file(
        &self,
        path: &Path,
        access: FileAccessMode,
        flags: OpenFlags,
    ) -> Result<Box<dyn Stream>> {
        if flags.truncate && !access.is_writable() {
            return Err(Error::InvalidArgument);
        }
        let stream = FileStream::open_with(
            self.resolve(path),
            access.is_readable(),
            access.is_writable(),
            flags.truncate,
        )?;
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_to_vec(stream: &mut dyn Stream) -> Vec<u8> {
        let mut out = vec![0u8; stream.len().unwrap() as usize];
        stream.read_exact(&mut out).unwrap();
        out
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new(dir.path());

        fs.create_directory(&Path::new("sub")).unwrap();
        // Repeated creation is not an error.
        fs.create_directory(&Path::new("sub")).unwrap();

        let path = Path::new("sub/hello.txt");
        {
            let mut s = fs
                .open_file(&path, FileAccessMode::Write, OpenFlags { truncate: true })
                .unwrap();
            s.write_all(b"hello").unwrap();
        }

        let attr = fs.file_attribute(&path).unwrap();
        assert_eq!(attr.file_type, FileType::RegularFile);
        assert_eq!(attr.size, 5);

        let mut s = fs
            .open_file(&path, FileAccessMode::Read, OpenFlags::default())
            .unwrap();
        assert_eq!(read_to_vec(s.as_mut()), b"hello");
    }

    #[test]
    fn test_visit_directory_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let fs = LocalFileSystem::new(dir.path());
        let mut names: Vec<String> = fs
            .visit_directory(&Path::new("."))
            .unwrap()
            .map(|p| p.unwrap().as_str().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["a.txt", "b.txt", "c"]);
    }

    #[test]
    fn test_missing_paths_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new(dir.path());

        assert!(matches!(
            fs.file_attribute(&Path::new("nope")),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            fs.visit_directory(&Path::new("nope")),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            fs.open_file(
                &Path::new("nope"),
                FileAccessMode::Read,
                OpenFlags::default()
            ),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_remove_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), b"x").unwrap();

        let fs = LocalFileSystem::new(dir.path());
        fs.rename(&Path::new("old.txt"), &Path::new("new.txt"))
            .unwrap();
        assert!(fs.file_attribute(&Path::new("old.txt")).is_err());

        fs.remove(&Path::new("new.txt")).unwrap();
        assert!(matches!(
            fs.file_attribute(&Path::new("new.txt")),
            Err(Error::NotFound)
        ));
    }
}
