//! Layered file system composition.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{Error, Path, Result, Stream};

use super::{DirectoryIterator, FileAccessMode, FileAttribute, FileSystem, OpenFlags};

/// Stacks file systems so that later-mounted layers shadow earlier ones.
///
/// Every operation tries the layers from top to bottom and returns the first
/// success. A layer that reports "not supported" or "not found" passes the
/// request on; any other error is remembered and becomes the overall result
/// when no layer succeeds. Directory creation is the exception: there "not
/// found" is itself a result worth surfacing, so only "not supported" passes
/// the request on.
#[derive(Default)]
pub struct OverlayFileSystem {
    layers: Vec<Arc<dyn FileSystem>>,
}

impl OverlayFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a layer on top of the stack.
    pub fn push_layer(&mut self, fs: Arc<dyn FileSystem>) {
        self.layers.push(fs);
    }

    /// Unmount and return the topmost layer.
    pub fn pop_layer(&mut self) -> Option<Arc<dyn FileSystem>> {
        self.layers.pop()
    }

    /// Unmount the layer at `index`, counted from the bottom.
    pub fn remove_layer_at(&mut self, index: usize) -> Option<Arc<dyn FileSystem>> {
        if index < self.layers.len() {
            Some(self.layers.remove(index))
        } else {
            None
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Borrow the layer at `index`, counted from the bottom.
    pub fn layer(&self, index: usize) -> Option<&Arc<dyn FileSystem>> {
        self.layers.get(index)
    }

    /// Run `op` over the layers, top first, keeping the most meaningful
    /// error when every layer declines.
    fn try_layers<T>(
        &self,
        default_error: Error,
        mut op: impl FnMut(&dyn FileSystem) -> Result<T>,
    ) -> Result<T> {
        let mut last_error = default_error;
        for layer in self.layers.iter().rev() {
            match op(layer.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_not_supported() && !e.is_not_found() {
                        last_error = e;
                    }
                }
            }
        }
        Err(last_error)
    }
}

impl FileSystem for OverlayFileSystem {
    fn create_directory(&self, path: &Path) -> Result<()> {
        // Creation is not a lookup: a layer reporting "not found" (say, a
        // missing parent) is a real failure to surface, so only "not
        // supported" passes the request on.
        let mut last_error = Error::NotSupported;
        for layer in self.layers.iter().rev() {
            match layer.create_directory(path) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if !e.is_not_supported() {
                        last_error = e;
                    }
                }
            }
        }
        Err(last_error)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.try_layers(Error::NotFound, |fs| fs.remove(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.try_layers(Error::NotFound, |fs| fs.rename(from, to))
    }

    fn file_attribute(&self, path: &Path) -> Result<FileAttribute> {
        self.try_layers(Error::NotFound, |fs| fs.file_attribute(path))
    }

    fn visit_directory(&self, path: &Path) -> Result<DirectoryIterator> {
        // Make sure at least one layer has the directory before handing out
        // the merged iterator.
        self.try_layers(Error::NotFound, |fs| {
            fs.visit_directory(path).map(drop)
        })?;
        Ok(Box::new(OverlayDirectoryIterator {
            layers: self.layers.iter().rev().cloned().collect(),
            path: path.clone(),
            next_layer: 0,
            current: None,
            visited: BTreeSet::new(),
        }))
    }

    fn open_file(
        &self,
        path: &Path,
        access: FileAccessMode,
        flags: OpenFlags,
    ) -> Result<Box<dyn Stream>> {
        self.try_layers(Error::NotFound, |fs| fs.open_file(path, access, flags))
    }
}

/// Merged directory iteration across the overlay's layers.
///
/// Entries shadowed by an upper layer are yielded once; layers that cannot
/// list the directory are skipped.
struct OverlayDirectoryIterator {
    /// Top layer first.
    layers: Vec<Arc<dyn FileSystem>>,
    path: Path,
    next_layer: usize,
    current: Option<DirectoryIterator>,
    visited: BTreeSet<Path>,
}

impl Iterator for OverlayDirectoryIterator {
    type Item = Result<Path>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(iter) = &mut self.current {
                for item in iter {
                    match item {
                        Ok(name) => {
                            if self.visited.insert(name.clone()) {
                                return Some(Ok(name));
                            }
                        }
                        Err(e) => return Some(Err(e)),
                    }
                }
                self.current = None;
            }

            let layer = self.layers.get(self.next_layer)?;
            self.next_layer += 1;
            // A layer without the directory contributes nothing.
            self.current = layer.visit_directory(&self.path).ok();
        }
    }
}
