use actix_secure_headers::{ConfigurationError, HashAlgorithm, HashGenerator, HashManifest};
use std::io::Write;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"{
    "scripts": {
        "app/views/home.html": ["'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='"]
    },
    "styles": {
        "app/views/home.html": [
            "'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='",
            "'sha384-OLBgp1GsljhM2TJ+sbHjaiH9txEUvgdDTAzHv2P24donTt6/529l+9Ua0vFImLlb'"
        ]
    }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = HashManifest::from_path(file.path()).unwrap();

        assert!(!manifest.is_empty());
        assert_eq!(manifest.script_hashes("app/views/home.html").len(), 1);
        assert_eq!(manifest.style_hashes("app/views/home.html").len(), 2);
        assert!(manifest.script_hashes("unknown.html").is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let manifest = HashManifest::from_path(dir.path().join("missing.json")).unwrap();

        assert!(manifest.is_empty());
    }

    #[test]
    fn test_contains_inline_content() {
        let manifest = HashManifest::from_json_str(MANIFEST).unwrap();

        assert!(manifest.contains_script("app/views/home.html", ""));
        assert!(manifest.contains_style("app/views/home.html", ""));
        assert!(!manifest.contains_script("app/views/home.html", "alert(1)"));
        assert!(!manifest.contains_script("other.html", ""));
    }

    #[test]
    fn test_rejects_non_hash_entries() {
        let result = HashManifest::from_json_str(r#"{ "scripts": { "a": ["'self'"] } }"#);
        assert!(matches!(result, Err(ConfigurationError::Manifest(_))));

        let result = HashManifest::from_json_str("not json");
        assert!(matches!(result, Err(ConfigurationError::Manifest(_))));
    }

    #[test]
    fn test_env_override_of_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        std::env::set_var("SECURE_HEADERS_HASH_FILE", file.path());

        assert_eq!(HashManifest::default_path(), file.path());
        assert!(!HashManifest::load().unwrap().is_empty());

        std::env::remove_var("SECURE_HEADERS_HASH_FILE");
    }

    #[test]
    fn test_generated_hash_matches_manifest_format() {
        let source: String = HashGenerator::generate_source(HashAlgorithm::Sha256, b"").into();

        assert_eq!(source, "'sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU='");
        assert!(HashGenerator::matches(&source, b""));
        assert!(!HashGenerator::matches(&source, b"x"));
    }
}
