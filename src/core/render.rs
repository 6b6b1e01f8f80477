use crate::constants::{
    HEADER_CSP, HEADER_CSP_REPORT_ONLY, NONE_SOURCE, SEMICOLON_SPACE, STAR_SOURCE,
};
use crate::core::directives::{Directive, Family};
use crate::core::policy::{DirectiveValue, PolicyConfig};
use crate::headers::RenderedHeader;

/// Header name for `policy`, honoring its `report_only` flag.
#[inline]
pub fn header_name(policy: &PolicyConfig) -> &'static str {
    if policy.is_report_only() {
        HEADER_CSP_REPORT_ONLY
    } else {
        HEADER_CSP
    }
}

/// Serializes `policy` for `family`.
///
/// Directives the family does not understand are skipped. Output order is the
/// canonical directive order, so the result only depends on the policy contents.
pub fn render(policy: &PolicyConfig, family: Family) -> String {
    let mut value = String::with_capacity(256);
    let preserve_schemes = policy.preserves_schemes();

    for (directive, directive_value) in policy.directives() {
        if !family.supports(directive) {
            continue;
        }
        let start = value.len();
        if start > 0 {
            value.push_str(SEMICOLON_SPACE);
        }
        let written = match directive_value {
            DirectiveValue::Sources(sources) => {
                write_sources(&mut value, directive, sources, preserve_schemes)
            }
            DirectiveValue::Flag(true) => {
                value.push_str(directive.name());
                true
            }
            DirectiveValue::Flag(false) => false,
            DirectiveValue::Text(text) => {
                value.push_str(directive.name());
                if !text.is_empty() {
                    value.push(' ');
                    value.push_str(text);
                }
                true
            }
        };
        if !written {
            value.truncate(start);
        }
    }

    value
}

#[inline]
pub fn render_header(policy: &PolicyConfig, family: Family) -> RenderedHeader {
    RenderedHeader::new(header_name(policy), render(policy, family))
}

fn write_sources(
    buffer: &mut String,
    directive: Directive,
    sources: &[String],
    preserve_schemes: bool,
) -> bool {
    let sources = normalize_sources(directive, sources, preserve_schemes);
    if sources.is_empty() {
        return false;
    }
    buffer.push_str(directive.name());
    for source in sources {
        buffer.push(' ');
        buffer.push_str(source);
    }
    true
}

/// De-duplicates a source list and applies the wildcard, `'none'` and scheme rules.
fn normalize_sources<'a>(
    directive: Directive,
    sources: &'a [String],
    preserve_schemes: bool,
) -> Vec<&'a str> {
    let wildcard = sources.iter().any(|s| s == STAR_SOURCE);
    let strip = !preserve_schemes && directive != Directive::ReportUri;

    let mut normalized: Vec<&str> = Vec::with_capacity(sources.len());
    for source in sources {
        let source = source.trim();
        if source.is_empty() || (wildcard && source != STAR_SOURCE && !source.starts_with('\'')) {
            continue;
        }
        let source = if strip { strip_scheme(source) } else { source };
        if !normalized.contains(&source) {
            normalized.push(source);
        }
    }

    if normalized.len() > 1 {
        normalized.retain(|source| *source != NONE_SOURCE);
    }
    normalized
}

#[inline]
fn strip_scheme(source: &str) -> &str {
    source
        .strip_prefix("https://")
        .or_else(|| source.strip_prefix("http://"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::PolicyConfigBuilder;

    #[test]
    fn wildcard_keeps_only_keywords() {
        let policy = PolicyConfigBuilder::new()
            .default_src(["*", "a.com", "'unsafe-inline'"])
            .build_unchecked();
        assert_eq!(render(&policy, Family::Chrome), "default-src * 'unsafe-inline'");
    }

    #[test]
    fn none_is_dropped_next_to_other_sources() {
        let policy = PolicyConfigBuilder::new()
            .default_src(["'none'", "'self'"])
            .object_src(["'none'"])
            .build_unchecked();
        assert_eq!(
            render(&policy, Family::Chrome),
            "default-src 'self'; object-src 'none'"
        );
    }

    #[test]
    fn schemes_stripped_unless_preserved() {
        let policy = PolicyConfigBuilder::new()
            .default_src(["https://a.com", "http://a.com"])
            .report_uri(["https://r.example.com/csp"])
            .build_unchecked();
        assert_eq!(
            render(&policy, Family::Other),
            "default-src a.com; report-uri https://r.example.com/csp"
        );

        let preserved = PolicyConfigBuilder::new()
            .default_src(["https://a.com"])
            .preserve_schemes(true)
            .build_unchecked();
        assert_eq!(render(&preserved, Family::Other), "default-src https://a.com");
    }

    #[test]
    fn flags_and_strings() {
        let policy = PolicyConfigBuilder::new()
            .default_src(["'self'"])
            .upgrade_insecure_requests(true)
            .block_all_mixed_content(false)
            .sandbox("allow-forms allow-scripts")
            .build_unchecked();
        assert_eq!(
            render(&policy, Family::Chrome),
            "default-src 'self'; sandbox allow-forms allow-scripts; upgrade-insecure-requests"
        );
    }
}
