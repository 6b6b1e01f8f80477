use crate::constants::{DEFAULT_HASH_FILE, HASH_FILE_ENV};
use crate::error::ConfigurationError;
use crate::security::hash::{HashAlgorithm, HashGenerator};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Precomputed inline script and style hashes, keyed by template identifier.
///
/// Each entry holds quoted hash sources such as `'sha256-…'`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HashManifest {
    #[serde(default)]
    scripts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    styles: BTreeMap<String, Vec<String>>,
}

impl HashManifest {
    /// Path from `SECURE_HEADERS_HASH_FILE`, or the default location.
    pub fn default_path() -> PathBuf {
        std::env::var_os(HASH_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HASH_FILE))
    }

    #[inline]
    pub fn load() -> Result<Self, ConfigurationError> {
        Self::from_path(Self::default_path())
    }

    /// Reads a manifest file. A missing file yields an empty manifest.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                log::debug!("Loading hash manifest from {}", path.display());
                Self::from_json_str(&contents)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No hash manifest at {}, using an empty one", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigurationError::Manifest(format!(
                "{}: {}",
                path.display(),
                err
            ))),
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigurationError> {
        let manifest: Self = serde_json::from_str(contents)
            .map_err(|err| ConfigurationError::Manifest(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let entries = self.scripts.iter().chain(self.styles.iter());
        for (identifier, hashes) in entries {
            if let Some(hash) = hashes
                .iter()
                .find(|hash| HashAlgorithm::of_source(hash).is_none())
            {
                return Err(ConfigurationError::Manifest(format!(
                    "{identifier}: {hash} is not a quoted hash source"
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn script_hashes(&self, identifier: &str) -> &[String] {
        self.scripts.get(identifier).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn style_hashes(&self, identifier: &str) -> &[String] {
        self.styles.get(identifier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether inline script `content` from `identifier` has a recorded hash.
    pub fn contains_script(&self, identifier: &str, content: &str) -> bool {
        self.script_hashes(identifier)
            .iter()
            .any(|hash| HashGenerator::matches(hash, content.as_bytes()))
    }

    /// Whether inline style `content` from `identifier` has a recorded hash.
    pub fn contains_style(&self, identifier: &str, content: &str) -> bool {
        self.style_hashes(identifier)
            .iter()
            .any(|hash| HashGenerator::matches(hash, content.as_bytes()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty()
    }
}
