//! Byte sources consulted when a credential is given as a path.
//!
//! Two readers are used, in order: [`DiskStorage`], which resolves logical
//! paths under an application storage root, and [`LocalFileSystem`], which
//! takes paths as-is.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Default root for [`DiskStorage`], the conventional local application disk.
pub const DEFAULT_STORAGE_ROOT: &str = "storage/app";

/// Something that can test for and read a named resource.
pub trait ResourceReader: Send + Sync {
    /// Returns the concrete path `name` maps to, or `None` if it does not exist.
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// Reads the full contents of a path previously returned by [`Self::locate`].
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------

/// Logical paths resolved relative to a storage root.
///
/// Absolute paths and `..` components are never resolved, so a name can only
/// reach files below the root.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Creates a reader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for DiskStorage {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl ResourceReader for DiskStorage {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        if name.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        let candidate = self.root.join(relative);
        candidate.is_file().then_some(candidate)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

// ---------------------------------------------------------------------------

/// Plain local filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl ResourceReader for LocalFileSystem {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        let candidate = PathBuf::from(name);
        candidate.is_file().then_some(candidate)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
