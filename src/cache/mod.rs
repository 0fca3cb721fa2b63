//! Response cache for generated explanations.
//!
//! Entries are keyed by a content fingerprint (see [`cache_key`]) and hold
//! the base64-encoded completion text. A disabled cache reports every key as
//! absent and silently drops stores.

pub mod file;
pub mod memory;

use crate::config::types::{CacheConfig, CacheKind};
use std::sync::Arc;

pub use file::FileCache;
pub use memory::MemoryCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry {0} not found")]
    NotFound(String),

    #[error("cache directory could not be determined")]
    NoCacheDir,
}

/// Key/value store for explanation payloads.
pub trait Cache: Send + Sync {
    fn exists(&self, key: &str) -> bool;

    fn load(&self, key: &str) -> Result<String, CacheError>;

    fn store(&self, key: &str, data: &str) -> Result<(), CacheError>;

    fn is_disabled(&self) -> bool;

    fn name(&self) -> &str;
}

/// Fingerprint for one explanation request.
///
/// Hex BLAKE3 digest of `"<provider>-<language>-<input>"`.
pub fn cache_key(provider: &str, language: &str, input: &str) -> String {
    let data = format!("{}-{}-{}", provider, language, input);
    blake3::hash(data.as_bytes()).to_hex().to_string()
}

/// Build the configured cache; `disabled` comes from `--no-cache`.
pub fn from_config(config: &CacheConfig, disabled: bool) -> Result<Arc<dyn Cache>, CacheError> {
    let cache: Arc<dyn Cache> = match config.kind {
        CacheKind::Memory => Arc::new(MemoryCache::new().with_disabled(disabled)),
        CacheKind::File => {
            let cache = match &config.directory {
                Some(dir) => FileCache::new(dir.clone()),
                None => FileCache::in_user_cache_dir()?,
            };
            log::debug!("File cache directory {}", cache.directory().display());
            Arc::new(cache.with_disabled(disabled))
        }
    };
    log::debug!(
        "Using {} cache{}",
        cache.name(),
        if disabled { " (disabled)" } else { "" }
    );
    Ok(cache)
}
