//! Policy validation.
//!
//! Raw JSON policies are checked for shape while they are converted, typed policies
//! are checked for the rules the type system cannot express: the mandatory
//! `default_src`, value kinds assigned through [`PolicyConfig::insert`], empty
//! source lists, and legacy unquoted keywords.

use crate::constants::{DEPRECATED_KEYWORDS, META_PRESERVE_SCHEMES, META_REPORT_ONLY, OPT_OUT};
use crate::core::directives::{Directive, DirectiveKind};
use crate::core::policy::{DirectiveValue, PolicyConfig, SourceList};
use crate::core::setting::Setting;
use crate::error::ConfigurationError;
use serde_json::{Map, Value};

/// Validates a policy slot. Opted-out policies are always valid.
pub fn validate(setting: &Setting<PolicyConfig>) -> Result<(), ConfigurationError> {
    match setting {
        Setting::OptOut => Ok(()),
        Setting::Configured(policy) => validate_policy(policy),
    }
}

pub fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigurationError> {
    if !policy.contains(Directive::DefaultSrc) {
        return Err(ConfigurationError::MissingDefaultSrc);
    }
    validate_directives(policy)?;
    check_no_empty_lists(policy)
}

/// Checks every directive of a policy or additions map, without requiring `default_src`.
pub fn validate_directives(policy: &PolicyConfig) -> Result<(), ConfigurationError> {
    for (directive, value) in policy.directives() {
        if value.kind() != directive.kind() {
            return Err(type_mismatch(directive.key(), directive.kind()));
        }
        if let DirectiveValue::Sources(sources) = value {
            check_deprecated(directive.key(), sources.iter().map(String::as_str))?;
        }
    }
    Ok(())
}

/// Validates a raw JSON policy, including the `"opt_out"` sentinel.
pub fn validate_json(value: &Value) -> Result<(), ConfigurationError> {
    if is_opt_out_json(value) {
        return Ok(());
    }
    parse_policy(value, true).map(drop)
}

#[inline]
pub(crate) fn is_opt_out_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(token) => token == OPT_OUT,
        _ => false,
    }
}

pub(crate) fn parse_policy(
    value: &Value,
    require_default_src: bool,
) -> Result<PolicyConfig, ConfigurationError> {
    let map = value
        .as_object()
        .ok_or_else(|| ConfigurationError::TypeMismatch {
            directive: "policy".to_string(),
            expected: "a map of directives",
        })?;

    if require_default_src && map.get(Directive::DefaultSrc.key()).map_or(true, Value::is_null) {
        return Err(ConfigurationError::MissingDefaultSrc);
    }

    let mut policy = PolicyConfig::new();
    let report_only = parse_meta(map, META_REPORT_ONLY)?;
    let preserve_schemes = parse_meta(map, META_PRESERVE_SCHEMES)?;
    policy.set_meta(report_only, preserve_schemes);

    for (key, raw) in map {
        if key == META_REPORT_ONLY || key == META_PRESERVE_SCHEMES {
            continue;
        }
        let directive = Directive::from_key(key)
            .ok_or_else(|| ConfigurationError::UnknownDirective(key.clone()))?;
        if raw.is_null() {
            continue;
        }
        let value = parse_value(directive, raw)?;
        policy.insert(directive, value);
    }

    if require_default_src {
        check_no_empty_lists(&policy)?;
    }
    Ok(policy)
}

/// Complete policies never hold an empty source list: it would render as an empty
/// directive and disappear on the first merge.
fn check_no_empty_lists(policy: &PolicyConfig) -> Result<(), ConfigurationError> {
    match policy.directives().find(|(_, value)| value.is_empty_list()) {
        Some((directive, _)) => Err(ConfigurationError::EmptySourceList(directive.key().to_string())),
        None => Ok(()),
    }
}

fn parse_meta(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, ConfigurationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ConfigurationError::InvalidMetaValue(key.to_string())),
    }
}

fn parse_value(directive: Directive, raw: &Value) -> Result<DirectiveValue, ConfigurationError> {
    let kind = directive.kind();
    match (kind, raw) {
        (DirectiveKind::Boolean, Value::Bool(flag)) => Ok(DirectiveValue::Flag(*flag)),
        (DirectiveKind::StringValue, Value::String(text)) => Ok(DirectiveValue::Text(text.clone())),
        (DirectiveKind::SourceList, Value::Array(entries)) => {
            let mut sources = SourceList::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Value::Null => {}
                    Value::String(source) => sources.push(source.clone()),
                    _ => return Err(type_mismatch(directive.key(), kind)),
                }
            }
            check_deprecated(directive.key(), sources.iter().map(String::as_str))?;
            Ok(DirectiveValue::Sources(sources))
        }
        _ => Err(type_mismatch(directive.key(), kind)),
    }
}

fn check_deprecated<'a>(
    key: &str,
    mut sources: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    match sources.find(|source| DEPRECATED_KEYWORDS.iter().any(|keyword| keyword == source)) {
        Some(keyword) => Err(ConfigurationError::DeprecatedKeyword {
            directive: key.to_string(),
            keyword: keyword.to_string(),
        }),
        None => Ok(()),
    }
}

#[inline]
fn type_mismatch(key: &str, kind: DirectiveKind) -> ConfigurationError {
    ConfigurationError::TypeMismatch {
        directive: key.to_string(),
        expected: kind.describe(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nulls_inside_source_lists_are_dropped() {
        let policy = parse_policy(&json!({"default_src": ["'self'", null]}), true).unwrap();
        assert_eq!(policy.sources(Directive::DefaultSrc).unwrap().len(), 1);
    }

    #[test]
    fn null_directive_is_absent() {
        let policy = parse_policy(&json!({"default_src": ["'self'"], "img_src": null}), true)
            .unwrap();
        assert!(!policy.contains(Directive::ImgSrc));
    }

    #[test]
    fn list_of_nulls_is_empty() {
        assert_eq!(
            parse_policy(&json!({"default_src": [null]}), true).map(drop),
            Err(ConfigurationError::EmptySourceList("default_src".to_string()))
        );
        // Additions may name an empty list; merging seeds it from default_src.
        let additions = parse_policy(&json!({"script_src": []}), false).unwrap();
        assert!(additions.get(Directive::ScriptSrc).unwrap().is_empty_list());
    }
}
