use super::{Cache, CacheError};
use dashmap::DashMap;

/// Process-local cache, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
    disabled: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    fn exists(&self, key: &str) -> bool {
        !self.disabled && self.entries.contains_key(key)
    }

    fn load(&self, key: &str) -> Result<String, CacheError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    fn store(&self, key: &str, data: &str) -> Result<(), CacheError> {
        if !self.disabled {
            self.entries.insert(key.to_string(), data.to_string());
        }
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn name(&self) -> &str {
        "memory"
    }
}
