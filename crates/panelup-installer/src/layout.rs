use std::path::{Path, PathBuf};

/// Directories that must stay writable by the web server, relative to the root.
pub const WRITABLE_DIRS: [&str; 2] = ["storage", "bootstrap/cache"];

pub const WRITABLE_DIR_MODE: &str = "755";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.root.join("storage")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.storage_dir().join("logs")
    }

    pub fn bootstrap_cache_dir(&self) -> PathBuf {
        self.root.join("bootstrap").join("cache")
    }

    pub fn artisan_path(&self) -> PathBuf {
        self.root.join("artisan")
    }
}
