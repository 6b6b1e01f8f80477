use actix_secure_headers::core::validate::{validate, validate_directives, validate_json};
use actix_secure_headers::{
    ConfigurationError, Directive, DirectiveValue, PolicyConfig, PolicyConfigBuilder, Setting,
};
use serde_json::{json, Value};
use test_case::test_case;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_opt_out_is_always_valid() {
        assert_eq!(validate(&Setting::OptOut), Ok(()));
        assert_eq!(validate_json(&json!("opt_out")), Ok(()));
        assert_eq!(
            Setting::<PolicyConfig>::from_json(&json!("opt_out")),
            Ok(Setting::OptOut)
        );
    }

    #[test]
    fn test_missing_default_src() {
        let policy = PolicyConfigBuilder::new()
            .script_src(["'self'"])
            .build_unchecked();

        assert_eq!(
            validate(&Setting::Configured(policy)),
            Err(ConfigurationError::MissingDefaultSrc)
        );
        assert_eq!(
            validate_json(&json!({ "script_src": ["'self'"] })),
            Err(ConfigurationError::MissingDefaultSrc)
        );
        assert_eq!(
            validate_json(&json!({ "default_src": null })),
            Err(ConfigurationError::MissingDefaultSrc)
        );
    }

    #[test_case(json!({ "default_src": ["self"] }), "default_src", "self"; "self")]
    #[test_case(json!({ "default_src": ["'self'"], "script_src": ["inline"] }), "script_src", "inline"; "inline")]
    #[test_case(json!({ "default_src": ["'self'"], "script_src": ["eval"] }), "script_src", "eval"; "eval")]
    #[test_case(json!({ "default_src": ["'self'"], "object_src": ["none"] }), "object_src", "none"; "none")]
    fn test_deprecated_keywords(value: Value, directive: &str, keyword: &str) {
        assert_eq!(
            validate_json(&value),
            Err(ConfigurationError::DeprecatedKeyword {
                directive: directive.to_string(),
                keyword: keyword.to_string(),
            })
        );
    }

    #[test]
    fn test_quoted_keywords_are_accepted() {
        let value = json!({
            "default_src": ["'self'"],
            "script_src": ["'unsafe-inline'", "'unsafe-eval'", "selfish.example.com"],
            "object_src": ["'none'"],
        });
        assert_eq!(validate_json(&value), Ok(()));
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(
            validate_json(&json!({ "default_src": ["'self'"], "script-src": ["'self'"] })),
            Err(ConfigurationError::UnknownDirective("script-src".to_string()))
        );
    }

    #[test_case(json!({ "default_src": "'self'" }), "default_src"; "source list given a string")]
    #[test_case(json!({ "default_src": ["'self'"], "sandbox": true }), "sandbox"; "string given a bool")]
    #[test_case(json!({ "default_src": ["'self'"], "upgrade_insecure_requests": "yes" }), "upgrade_insecure_requests"; "bool given a string")]
    #[test_case(json!({ "default_src": [1] }), "default_src"; "non string source")]
    fn test_type_mismatch(value: Value, directive: &str) {
        match validate_json(&value) {
            Err(ConfigurationError::TypeMismatch { directive: found, .. }) => {
                assert_eq!(found, directive)
            }
            other => panic!("expected a type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_values_must_be_boolean() {
        assert_eq!(
            validate_json(&json!({ "default_src": ["'self'"], "report_only": "true" })),
            Err(ConfigurationError::InvalidMetaValue("report_only".to_string()))
        );
        assert_eq!(
            validate_json(&json!({ "default_src": ["'self'"], "preserve_schemes": 1 })),
            Err(ConfigurationError::InvalidMetaValue("preserve_schemes".to_string()))
        );
    }

    #[test]
    fn test_json_conversion() {
        let value = json!({
            "default_src": ["'self'", null],
            "img_src": null,
            "block_all_mixed_content": true,
            "sandbox": "allow-forms",
            "report_only": true,
        });

        let policy = PolicyConfig::from_json(&value).unwrap();

        assert_eq!(policy.sources(Directive::DefaultSrc).unwrap(), ["'self'"]);
        assert!(!policy.contains(Directive::ImgSrc));
        assert_eq!(
            policy.get(Directive::BlockAllMixedContent),
            Some(&DirectiveValue::Flag(true))
        );
        assert_eq!(
            policy.get(Directive::Sandbox),
            Some(&DirectiveValue::Text("allow-forms".to_string()))
        );
        assert!(policy.is_report_only());
    }

    #[test]
    fn test_additions_do_not_require_default_src() {
        let additions = PolicyConfig::from_json(&json!({ "script_src": ["cdn.example.com"] }));
        assert!(additions.is_ok());
    }

    #[test]
    fn test_typed_kind_mismatch() {
        let mut policy = PolicyConfig::new();
        policy.insert(Directive::ScriptSrc, DirectiveValue::Flag(true));

        assert!(matches!(
            validate_directives(&policy),
            Err(ConfigurationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_builder_validates() {
        assert_eq!(
            PolicyConfigBuilder::new().img_src(["'self'"]).build(),
            Err(ConfigurationError::MissingDefaultSrc)
        );
        assert!(PolicyConfigBuilder::new()
            .default_src(["'self'"])
            .build()
            .is_ok());
    }

    #[test]
    fn test_empty_source_lists_are_rejected() {
        let policy = PolicyConfigBuilder::new()
            .default_src(["'self'"])
            .img_src(Vec::<String>::new())
            .build_unchecked();

        assert_eq!(
            validate(&Setting::Configured(policy)),
            Err(ConfigurationError::EmptySourceList("img_src".to_string()))
        );
        assert_eq!(
            validate_json(&json!({"default_src": [], "script_src": ["'self'"]})),
            Err(ConfigurationError::EmptySourceList("default_src".to_string()))
        );
        // Additions are not complete policies.
        assert_eq!(
            validate_directives(&PolicyConfigBuilder::new().img_src(Vec::<String>::new()).build_unchecked()),
            Ok(())
        );
    }
}
