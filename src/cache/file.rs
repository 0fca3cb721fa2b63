use super::{Cache, CacheError};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_SUBDIR: &str = "kube-doctor";

/// One file per key under a cache directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
    disabled: bool,
}

impl FileCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            disabled: false,
        }
    }

    /// `<user cache dir>/kube-doctor`
    pub fn in_user_cache_dir() -> Result<Self, CacheError> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(Self::new(base.join(CACHE_SUBDIR)))
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }
}

impl Cache for FileCache {
    fn exists(&self, key: &str) -> bool {
        !self.disabled && self.entry_path(key).is_file()
    }

    fn load(&self, key: &str) -> Result<String, CacheError> {
        let path = self.entry_path(key);
        if !path.is_file() {
            return Err(CacheError::NotFound(key.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    fn store(&self, key: &str, data: &str) -> Result<(), CacheError> {
        if self.disabled {
            return Ok(());
        }
        fs::create_dir_all(&self.directory)?;
        let path = self.entry_path(key);
        fs::write(&path, data)?;
        debug!("Cached explanation at {}", path.display());
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn name(&self) -> &str {
        "file"
    }
}
