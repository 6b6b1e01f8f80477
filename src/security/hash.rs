use crate::constants::{HASH_PREFIX_SHA256, HASH_PREFIX_SHA384, HASH_PREFIX_SHA512};
use crate::core::source::Source;
use crate::error::ConfigurationError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::digest::{self, SHA256, SHA384, SHA512};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[inline(always)]
    pub fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            HashAlgorithm::Sha256 => &SHA256,
            HashAlgorithm::Sha384 => &SHA384,
            HashAlgorithm::Sha512 => &SHA512,
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[inline(always)]
    pub const fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => HASH_PREFIX_SHA256,
            HashAlgorithm::Sha384 => HASH_PREFIX_SHA384,
            HashAlgorithm::Sha512 => HASH_PREFIX_SHA512,
        }
    }

    /// Algorithm of a quoted hash source such as `'sha256-…'`.
    pub fn of_source(source: &str) -> Option<Self> {
        [Self::Sha256, Self::Sha384, Self::Sha512]
            .into_iter()
            .find(|algorithm| {
                source.len() > algorithm.prefix().len() + 1
                    && source.starts_with(algorithm.prefix())
                    && source.ends_with('\'')
            })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for HashAlgorithm {
    type Error = ConfigurationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(ConfigurationError::Manifest(format!(
                "unsupported hash algorithm {s}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct HashGenerator;

impl HashGenerator {
    /// Base64 digest of `data`.
    #[inline]
    pub fn generate(algorithm: HashAlgorithm, data: &[u8]) -> String {
        let digest = digest::digest(algorithm.digest_algorithm(), data);
        BASE64.encode(digest.as_ref())
    }

    #[inline]
    pub fn generate_source(algorithm: HashAlgorithm, data: &[u8]) -> Source {
        Source::Hash {
            algorithm,
            value: Self::generate(algorithm, data).into(),
        }
    }

    /// Whether `source` (a quoted hash source) matches `data`.
    pub fn matches(source: &str, data: &[u8]) -> bool {
        match HashAlgorithm::of_source(source) {
            Some(algorithm) => Self::generate_source(algorithm, data).to_string() == source,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_known_input() {
        // SHA-256 of the empty string
        let source = HashGenerator::generate_source(HashAlgorithm::Sha256, b"");
        assert_eq!(
            source.to_string(),
            "'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='"
        );
    }

    #[test]
    fn matches_checks_algorithm_and_digest() {
        let source = HashGenerator::generate_source(HashAlgorithm::Sha384, b"x").to_string();
        assert!(HashGenerator::matches(&source, b"x"));
        assert!(!HashGenerator::matches(&source, b"y"));
        assert!(!HashGenerator::matches("'self'", b"x"));
    }
}
