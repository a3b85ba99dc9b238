//! [`TestCache`]: a cache document location inside a temporary directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hub_core::LkgStore;
use hub_core::lkg::LKG_FILE_NAME;
use tempfile::TempDir;

/// Temporary directory holding one cache document path.
///
/// The directory is removed when the fixture is dropped.
pub struct TestCache {
    temp_dir: TempDir,
}

impl Default for TestCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCache {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the cache document.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join(LKG_FILE_NAME)
    }

    /// A fresh store handle on the cache document.
    pub fn store(&self) -> Arc<LkgStore> {
        Arc::new(LkgStore::new(self.path()))
    }

    /// Write raw bytes as the cache document.
    pub fn write_raw(&self, content: &str) {
        std::fs::write(self.path(), content).unwrap();
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }
}
