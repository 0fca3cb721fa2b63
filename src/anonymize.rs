//! Reversible redaction of sensitive substrings.
//!
//! A [`Redactor`] is an ordered list of substitution rules. Masking applies
//! the rules front to back; unmasking applies the inverse substitutions back
//! to front, so text that only contains registered values survives a
//! mask/unmask round trip unchanged.

use crate::analyzer::types::{Failure, SensitiveMatch};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered substitution rules built from [`SensitiveMatch`] pairs.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: Vec<SensitiveMatch>,
}

impl Redactor {
    pub fn new(rules: Vec<SensitiveMatch>) -> Self {
        Self { rules }
    }

    /// Rules of a single failure, in the failure's own order.
    pub fn for_failure(failure: &Failure) -> Self {
        Self::new(failure.sensitive.clone())
    }

    /// Rules of every failure, concatenated in order.
    pub fn for_failures(failures: &[Failure]) -> Self {
        Self::new(
            failures
                .iter()
                .flat_map(|f| f.sensitive.iter().cloned())
                .collect(),
        )
    }

    /// Replace every unmasked value with its mask.
    pub fn mask(&self, text: &str) -> String {
        self.rules
            .iter()
            .filter(|rule| !rule.unmasked.is_empty())
            .fold(text.to_string(), |acc, rule| {
                acc.replace(&rule.unmasked, &rule.masked)
            })
    }

    /// Replace every mask with its original value.
    pub fn unmask(&self, text: &str) -> String {
        self.rules
            .iter()
            .rev()
            .filter(|rule| !rule.masked.is_empty())
            .fold(text.to_string(), |acc, rule| {
                acc.replace(&rule.masked, &rule.unmasked)
            })
    }
}

const MASK_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KEY_FILE_NAME: &str = "anonymize.key";

#[derive(Debug, thiserror::Error)]
pub enum MaskKeyError {
    #[error("Failed to access mask key {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mask key {0} is corrupt, delete it to generate a new one")]
    Corrupt(PathBuf),

    #[error("cache directory could not be determined")]
    NoCacheDir,
}

/// Per-install secret that keys every mask.
///
/// Masks are a keyed BLAKE3 stream over the value, so the same value masks
/// to the same string on one machine (cache keys stay stable) while a
/// provider without the key cannot map masks back to common names.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MaskKey([u8; 32]);

impl std::fmt::Debug for MaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MaskKey(..)")
    }
}

impl MaskKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Key file for this install: `<directory>/anonymize.key`, where
    /// `directory` defaults to the user cache directory.
    pub fn default_path(directory: Option<&Path>) -> Result<PathBuf, MaskKeyError> {
        let dir = match directory {
            Some(dir) => dir.to_path_buf(),
            None => dirs::cache_dir()
                .ok_or(MaskKeyError::NoCacheDir)?
                .join("kube-doctor"),
        };
        Ok(dir.join(KEY_FILE_NAME))
    }

    /// Read the key at `path`, creating it on first use.
    pub fn load_or_create(path: &Path) -> Result<Self, MaskKeyError> {
        let io_err = |source| MaskKeyError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let encoded = fs::read_to_string(path).map_err(io_err)?;
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|_| MaskKeyError::Corrupt(path.to_path_buf()))?;
            let bytes: [u8; 32] = bytes
                .try_into()
                .map_err(|_| MaskKeyError::Corrupt(path.to_path_buf()))?;
            return Ok(Self(bytes));
        }

        let key = Self::generate();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, STANDARD.encode(key.0)).map_err(io_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
        debug!("Generated anonymization key at {}", path.display());
        Ok(key)
    }

    /// Length-preserving mask for `value`.
    pub fn mask(&self, value: &str) -> String {
        let len = value.chars().count();
        let mut mask = String::with_capacity(len);
        let mut hasher = blake3::Hasher::new_keyed(&self.0);
        hasher.update(value.as_bytes());
        let mut reader = hasher.finalize_xof();
        let mut buf = [0u8; 1];
        for _ in 0..len {
            reader.fill(&mut buf);
            mask.push(MASK_ALPHABET[buf[0] as usize % MASK_ALPHABET.len()] as char);
        }
        if len > 0 && mask == value {
            // a mask equal to its input would leak it
            mask = "x".repeat(len);
            if mask == value {
                mask = "y".repeat(len);
            }
        }
        mask
    }

    /// Sensitive match for `value` masked under this key.
    pub fn sensitive(&self, value: &str) -> SensitiveMatch {
        SensitiveMatch::new(value, self.mask(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mask_then_unmask_restores_text() {
        let failure = Failure::new("Deployment payments/api has 3 replicas but 1 are available")
            .with_sensitive("payments", "Xk91aQzL")
            .with_sensitive("api", "bQz");
        let redactor = Redactor::for_failure(&failure);

        let masked = redactor.mask(&failure.text);
        assert!(!masked.contains("payments"));
        assert_eq!(redactor.unmask(&masked), failure.text);
    }

    #[test]
    fn test_mask_is_deterministic_and_length_preserving() {
        let key = MaskKey::new([7; 32]);
        let a = key.mask("kube-system");
        assert_eq!(a, key.mask("kube-system"));
        assert_eq!(a.len(), "kube-system".len());
        assert_ne!(a, "kube-system");
        assert_eq!(key.mask(""), "");
    }

    #[test]
    fn test_different_keys_give_different_masks() {
        let first = MaskKey::new([1; 32]);
        let second = MaskKey::new([2; 32]);
        for value in ["default", "kube-system", "prod"] {
            assert_ne!(first.mask(value), second.mask(value));
        }
        assert_ne!(MaskKey::generate().mask("default"), MaskKey::generate().mask("default"));
    }

    #[test]
    fn test_key_file_is_created_once_and_reused() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = MaskKey::default_path(Some(tmp.path())).unwrap();
        assert_eq!(path, tmp.path().join("anonymize.key"));

        let created = MaskKey::load_or_create(&path).unwrap();
        assert!(path.exists());
        let reloaded = MaskKey::load_or_create(&path).unwrap();
        assert_eq!(created, reloaded);
        assert_eq!(created.mask("payments"), reloaded.mask("payments"));
    }

    #[test]
    fn test_corrupt_key_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("anonymize.key");
        fs::write(&path, "not-a-key").unwrap();
        assert!(matches!(
            MaskKey::load_or_create(&path),
            Err(MaskKeyError::Corrupt(_))
        ));
    }

    #[test]
    fn test_empty_rules_are_ignored() {
        let redactor = Redactor::new(vec![SensitiveMatch::new("", "zzz")]);
        assert_eq!(redactor.mask("abc"), "abc");
        assert_eq!(redactor.unmask("abc"), "abc");
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            prefix in "[a-z ]{0,20}",
            secret in "[a-z]{3,12}",
            suffix in "[a-z ]{0,20}",
        ) {
            let mask = "§".repeat(secret.len());
            let text = format!("{prefix}{secret}{suffix}");
            let redactor = Redactor::new(vec![SensitiveMatch::new(secret.clone(), mask.clone())]);

            let masked = redactor.mask(&text);
            prop_assert!(!masked.contains(&secret));
            prop_assert_eq!(redactor.unmask(&masked), text);
        }
    }
}
