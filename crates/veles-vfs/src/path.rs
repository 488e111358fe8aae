//! Hierarchical path values for the virtual file system.
//!
//! A [`Path`] is an immutable sequence of non-empty segments plus an
//! absolute/relative flag. The canonical string and the segment offsets live
//! in one shared, reference-counted storage; `parent`, `file_name` and
//! `slice` are O(1) views over the same storage, so passing paths around and
//! narrowing them never copies segment data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Div;
use std::sync::Arc;

/// Shared backing storage: the canonical path string plus byte ranges of
/// every segment within it.
#[derive(Debug)]
struct Storage {
    full: String,
    /// (byte offset, byte length) of each segment in `full`.
    segments: Vec<(usize, usize)>,
}

/// An immutable, cheaply clonable VFS path.
///
/// Separators are normalized to `/` on construction; consecutive separators
/// collapse and a trailing separator is stripped. `.` and `..` are kept as
/// literal segments until [`Path::normalize`] is applied. Equality, ordering
/// and hashing use the canonical string form.
#[derive(Clone, Default)]
pub struct Path {
    storage: Option<Arc<Storage>>,
    /// Segment view range `[begin, end)` into `storage.segments`.
    begin: usize,
    end: usize,
}

impl Path {
    /// The empty path.
    pub const fn empty() -> Self {
        Path {
            storage: None,
            begin: 0,
            end: 0,
        }
    }

    /// Parse a path string.
    ///
    /// `\` is treated as `/` so the same strings work on Windows and UNIX
    /// inputs. An input that is empty after separator normalization yields
    /// the empty path. `.`/`..` are preserved literally.
    pub fn new(path: &str) -> Self {
        // An interior NUL terminates the path, matching C string semantics of
        // the platforms these paths originate from.
        let path = match path.find('\0') {
            Some(at) => &path[..at],
            None => path,
        };

        let absolute = path.starts_with('/') || path.starts_with('\\');

        let mut full = String::with_capacity(path.len());
        let mut segments = Vec::new();
        if absolute {
            full.push('/');
        }
        for raw in path.split(['/', '\\']) {
            if raw.is_empty() {
                continue;
            }
            if !segments.is_empty() {
                full.push('/');
            }
            segments.push((full.len(), raw.len()));
            full.push_str(raw);
        }

        if full.is_empty() {
            return Path::empty();
        }

        let count = segments.len();
        Path {
            storage: Some(Arc::new(Storage { full, segments })),
            begin: 0,
            end: count,
        }
    }

    /// Parse a path string and resolve `.`/`..` segments.
    ///
    /// `..` pops the previously accumulated segment and clamps at the root;
    /// the result is the plain `/`-joined segment list.
    pub fn normalize(path: &str) -> Self {
        let temp = Path::new(path);

        let mut kept: Vec<&str> = Vec::with_capacity(temp.segment_count());
        for segment in temp.segments() {
            match segment {
                "." => {}
                ".." => {
                    kept.pop();
                }
                other => kept.push(other),
            }
        }

        Path::new(&kept.join("/"))
    }

    /// Whether this is the empty path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_none()
    }

    /// Whether this is the bare root path `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(&self.storage, Some(s) if s.full.len() == 1 && s.full.starts_with('/'))
    }

    /// Whether this path view starts at the root.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        match &self.storage {
            Some(s) => self.begin == 0 && s.full.starts_with('/'),
            None => false,
        }
    }

    /// Number of segments in this view.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.end - self.begin
    }

    /// A single segment, or `None` when out of range.
    pub fn segment(&self, index: usize) -> Option<&str> {
        let storage = self.storage.as_deref()?;
        if index >= self.segment_count() {
            return None;
        }
        let (off, len) = storage.segments[self.begin + index];
        Some(&storage.full[off..off + len])
    }

    /// Iterate the segments of this view.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        let storage = self.storage.as_deref();
        (self.begin..self.end).filter_map(move |i| {
            let storage = storage?;
            let (off, len) = storage.segments[i];
            Some(&storage.full[off..off + len])
        })
    }

    /// Parent path as an O(1) view; empty when there are fewer than two
    /// segments.
    pub fn parent(&self) -> Path {
        if self.storage.is_none() || self.begin + 1 >= self.end {
            return Path::empty();
        }
        let mut ret = self.clone();
        ret.end -= 1;
        ret
    }

    /// Last segment as an O(1) view; the root path yields itself.
    pub fn file_name(&self) -> Path {
        if self.storage.is_none() {
            return Path::empty();
        }
        if self.is_root() {
            return self.clone();
        }
        let mut ret = self.clone();
        ret.begin = ret.end - 1;
        ret
    }

    /// Sub-range view over segments `[start, end)`; out-of-range inputs clamp
    /// and an empty range yields the empty path.
    pub fn slice(&self, start: usize, end: usize) -> Path {
        if self.storage.is_none() || start >= self.segment_count() {
            return Path::empty();
        }
        let end = end.min(self.segment_count());
        if start >= end {
            return Path::empty();
        }
        let mut ret = self.clone();
        ret.end = ret.begin + end;
        ret.begin += start;
        ret
    }

    /// Canonical string form of this view, in constant time.
    pub fn as_str(&self) -> &str {
        let storage = match &self.storage {
            Some(s) => s,
            None => return "",
        };
        if self.is_root() {
            return &storage.full;
        }
        debug_assert!(self.end > self.begin);

        // A view starting at segment 0 keeps the leading separator, if any.
        let start = if self.begin == 0 {
            0
        } else {
            storage.segments[self.begin].0
        };
        let (last_off, last_len) = storage.segments[self.end - 1];
        &storage.full[start..last_off + last_len]
    }

    /// Byte offset in the backing string where this view starts.
    fn view_start(&self) -> usize {
        match &self.storage {
            Some(s) if self.begin > 0 => s.segments[self.begin].0,
            _ => 0,
        }
    }

    /// Compose two paths.
    ///
    /// If `rhs` is absolute or `self` is empty the result is `rhs`; an empty
    /// `rhs` yields `self`. Otherwise a single new storage is allocated,
    /// sized exactly to the join, and every segment offset is recomputed
    /// against the new buffer.
    pub fn join(&self, rhs: &Path) -> Path {
        if self.is_empty() || rhs.is_absolute() {
            return rhs.clone();
        }
        if rhs.is_empty() {
            return self.clone();
        }

        let left = self.as_str();
        let right = rhs.as_str();
        debug_assert!(!right.starts_with('/'));

        let mut full = String::with_capacity(left.len() + right.len() + 1);
        full.push_str(left);
        if !left.ends_with('/') {
            full.push('/');
        }
        let right_base = full.len();
        full.push_str(right);

        let left_origin = self.view_start();
        let right_origin = rhs.view_start();

        let mut segments = Vec::with_capacity(self.segment_count() + rhs.segment_count());
        if let Some(storage) = &self.storage {
            for &(off, len) in &storage.segments[self.begin..self.end] {
                segments.push((off - left_origin, len));
            }
        }
        if let Some(storage) = &rhs.storage {
            for &(off, len) in &storage.segments[rhs.begin..rhs.end] {
                segments.push((off - right_origin + right_base, len));
            }
        }

        let count = segments.len();
        Path {
            storage: Some(Arc::new(Storage { full, segments })),
            begin: 0,
            end: count,
        }
    }
}

impl Div<&Path> for &Path {
    type Output = Path;

    fn div(self, rhs: &Path) -> Path {
        self.join(rhs)
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::new(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::new(&s)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Path {}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let p = Path::new("a/b/c");
        assert_eq!(p.segment_count(), 3);
        assert_eq!(p.as_str(), "a/b/c");
        assert!(!p.is_absolute());

        let p = Path::new("/a/b");
        assert!(p.is_absolute());
        assert_eq!(p.as_str(), "/a/b");
        assert_eq!(p.segment_count(), 2);
    }

    #[test]
    fn test_separator_normalization() {
        assert_eq!(Path::new("a\\b\\c").as_str(), "a/b/c");
        assert_eq!(Path::new("a//b///c").as_str(), "a/b/c");
        assert_eq!(Path::new("a/b/").as_str(), "a/b");
        assert_eq!(Path::new("\\a\\b").as_str(), "/a/b");
    }

    #[test]
    fn test_empty_and_root() {
        assert!(Path::new("").is_empty());
        assert_eq!(Path::new("").as_str(), "");

        let root = Path::new("/");
        assert!(root.is_root());
        assert!(root.is_absolute());
        assert_eq!(root.as_str(), "/");
        assert_eq!(root.segment_count(), 0);

        // Multiple separators still collapse to the root.
        assert!(Path::new("///").is_root());
    }

    #[test]
    fn test_dots_preserved_literally() {
        let p = Path::new("a/./b/../c");
        assert_eq!(p.segment_count(), 5);
        assert_eq!(p.segment(1), Some("."));
        assert_eq!(p.segment(3), Some(".."));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Path::normalize("a/./b/../c"), Path::normalize("a/c"));
        assert_eq!(Path::normalize("a/b/../../c").as_str(), "c");
        // `..` clamps at the root.
        assert_eq!(Path::normalize("../../a").as_str(), "a");
        assert!(Path::normalize("a/..").is_empty());
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["a/./b/../c", "x/y/z", "../q", "a//b/.", "/a/b/.."] {
            let once = Path::normalize(input);
            let twice = Path::normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_join() {
        let a = Path::new("a/b");
        let b = Path::new("c");
        let joined = &a / &b;
        assert_eq!(joined.as_str(), "a/b/c");
        assert_eq!(joined.segment_count(), 3);

        // Absolute right side wins.
        assert_eq!((&a / &Path::new("/etc")).as_str(), "/etc");
        // Empty operands.
        assert_eq!((&Path::empty() / &b).as_str(), "c");
        assert_eq!((&a / &Path::empty()).as_str(), "a/b");
        // Root left side does not double the separator.
        assert_eq!((&Path::new("/") / &b).as_str(), "/c");
    }

    #[test]
    fn test_join_parent_roundtrip() {
        let a = Path::new("data/maps");
        let b = Path::new("level1");
        assert_eq!((&a / &b).parent(), a);
    }

    #[test]
    fn test_join_from_sliced_views() {
        // Joining views must recompute offsets against the new buffer.
        let long = Path::new("a/bb/ccc/dddd");
        let mid = long.slice(1, 3);
        assert_eq!(mid.as_str(), "bb/ccc");

        let joined = &mid / &long.slice(3, 4);
        assert_eq!(joined.as_str(), "bb/ccc/dddd");
        assert_eq!(joined.segment(0), Some("bb"));
        assert_eq!(joined.segment(2), Some("dddd"));
    }

    #[test]
    fn test_parent_and_file_name() {
        let p = Path::new("a/b/c");
        assert_eq!(p.parent().as_str(), "a/b");
        assert_eq!(p.file_name().as_str(), "c");

        // Fewer than two segments: no parent.
        assert!(Path::new("a").parent().is_empty());
        assert!(Path::new("/").parent().is_empty());
        assert_eq!(Path::new("/").file_name().as_str(), "/");
        assert!(Path::empty().file_name().is_empty());
    }

    #[test]
    fn test_slice_views() {
        let p = Path::new("/a/b/c/d");
        assert_eq!(p.slice(1, 3).as_str(), "b/c");
        assert_eq!(p.slice(0, 2).as_str(), "/a/b");
        assert_eq!(p.slice(2, 99).as_str(), "c/d");
        assert!(p.slice(4, 5).is_empty());
        assert!(p.slice(2, 2).is_empty());
    }

    #[test]
    fn test_ordering_and_equality() {
        assert_eq!(Path::new("a//b"), Path::new("a/b"));
        assert!(Path::new("a/b") < Path::new("a/c"));
        assert_ne!(Path::new("/a"), Path::new("a"));
    }

    #[test]
    fn test_views_share_storage() {
        let p = Path::new("a/b/c");
        let parent = p.parent();
        // Views alias the same canonical string.
        assert!(std::ptr::eq(p.as_str().as_ptr(), parent.as_str().as_ptr()));
    }
}
