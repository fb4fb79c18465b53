//! Archive path keys.
//!
//! Entry paths are compared byte for byte, except that `\` and `/` are the
//! same separator. There is no case folding and no other normalization.
//!
//! [`ArchivePath`] is the borrowed, unsized key (like [`std::path::Path`])
//! and [`ArchivePathBuf`] the owned one. Because the owned key borrows as
//! the unsized one, a `HashMap<ArchivePathBuf, _>` can be queried with a
//! plain `&str` without allocating:
//!
//! ```rust
//! use std::collections::HashMap;
//! use transarc_core::path::{ArchivePath, ArchivePathBuf};
//!
//! let mut index = HashMap::new();
//! index.insert(ArchivePathBuf::from("textures/rock.png"), 7);
//! assert_eq!(index.get(ArchivePath::new("textures\\rock.png")), Some(&7));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

#[inline]
fn canonical(byte: u8) -> u8 {
    if byte == b'\\' { b'/' } else { byte }
}

fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| canonical(x) == canonical(y))
}

/// Stateless comparer implementing the archive path equivalence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathComparer;

impl PathComparer {
    /// Separator-insensitive, case-sensitive equality.
    pub fn equals(a: &str, b: &str) -> bool {
        bytes_equal(a.as_bytes(), b.as_bytes())
    }

    /// Feed `path` into `state` so that equal paths hash identically.
    pub fn hash<H: Hasher>(path: &str, state: &mut H) {
        for byte in path.bytes() {
            state.write_u8(canonical(byte));
        }
        // Length-terminate like `str` does so prefixes do not collide.
        state.write_u8(0xff);
    }

    /// True if `path` starts with `prefix` under the same equivalence.
    pub fn starts_with(path: &str, prefix: &str) -> bool {
        path.len() >= prefix.len() && bytes_equal(&path.as_bytes()[..prefix.len()], prefix.as_bytes())
    }
}

/// Borrowed archive path key.
#[repr(transparent)]
pub struct ArchivePath(str);

impl ArchivePath {
    /// Wrap a string slice.
    pub fn new<S: AsRef<str> + ?Sized>(path: &S) -> &ArchivePath {
        let path: &str = path.as_ref();
        // SAFETY: `ArchivePath` is `repr(transparent)` over `str`, so the two
        // references have identical layout and metadata.
        unsafe { &*(path as *const str as *const ArchivePath) }
    }

    /// The path exactly as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Copy the path with every separator written as `/`.
    pub fn to_forward_slashes(&self) -> String {
        self.0.replace('\\', "/")
    }

    /// Path segments, splitting on either separator.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(['/', '\\']).filter(|s| !s.is_empty())
    }
}

impl PartialEq for ArchivePath {
    fn eq(&self, other: &Self) -> bool {
        PathComparer::equals(&self.0, &other.0)
    }
}

impl Eq for ArchivePath {}

impl Hash for ArchivePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        PathComparer::hash(&self.0, state);
    }
}

impl fmt::Debug for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToOwned for ArchivePath {
    type Owned = ArchivePathBuf;

    fn to_owned(&self) -> ArchivePathBuf {
        ArchivePathBuf(self.0.to_owned())
    }
}

/// Owned archive path key.
#[derive(Clone, Default)]
pub struct ArchivePathBuf(String);

impl ArchivePathBuf {
    /// Wrap an owned string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Borrow as the unsized key.
    pub fn as_path(&self) -> &ArchivePath {
        ArchivePath::new(self.0.as_str())
    }

    /// Unwrap into the stored string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for ArchivePathBuf {
    type Target = ArchivePath;

    fn deref(&self) -> &ArchivePath {
        self.as_path()
    }
}

impl Borrow<ArchivePath> for ArchivePathBuf {
    fn borrow(&self) -> &ArchivePath {
        self.as_path()
    }
}

impl PartialEq for ArchivePathBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_path() == other.as_path()
    }
}

impl Eq for ArchivePathBuf {}

impl Hash for ArchivePathBuf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_path().hash(state);
    }
}

impl fmt::Debug for ArchivePathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ArchivePathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArchivePathBuf {
    fn from(path: &str) -> Self {
        Self(path.to_owned())
    }
}

impl From<String> for ArchivePathBuf {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArchivePathBuf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(path: &ArchivePath) -> u64 {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_separators_are_equivalent() {
        let a = ArchivePath::new("textures/rock.png");
        let b = ArchivePath::new("textures\\rock.png");
        assert_eq!(a, b);
        assert_eq!(hash_of(a), hash_of(b));
        assert!(PathComparer::equals("a\\b/c", "a/b\\c"));
    }

    #[test]
    fn test_case_is_significant() {
        let a = ArchivePath::new("textures/rock.png");
        let b = ArchivePath::new("Textures/rock.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefix_paths_differ() {
        assert!(!PathComparer::equals("a/b", "a/bc"));
        assert_ne!(hash_of(ArchivePath::new("a/b")), hash_of(ArchivePath::new("a/bc")));
    }

    #[test]
    fn test_owned_and_borrowed_agree() {
        let owned = ArchivePathBuf::from("meshes\\chair.obj");
        assert_eq!(hash_of(&owned), hash_of(ArchivePath::new("meshes/chair.obj")));

        let mut map = HashMap::new();
        map.insert(owned, 1);
        assert_eq!(map.get(ArchivePath::new("meshes/chair.obj")), Some(&1));
        assert_eq!(map.get(ArchivePath::new("Meshes/chair.obj")), None);
    }

    #[test]
    fn test_starts_with() {
        assert!(PathComparer::starts_with("assets\\textures\\a.png", "assets/textures"));
        assert!(!PathComparer::starts_with("assets", "assets/textures"));
    }

    #[test]
    fn test_segments() {
        let segments: Vec<_> = ArchivePath::new("a\\b//c.txt").segments().collect();
        assert_eq!(segments, ["a", "b", "c.txt"]);
        assert_eq!(ArchivePath::new("a\\b").to_forward_slashes(), "a/b");
    }
}
