use crate::constants::{
    HEADER_HSTS, HEADER_REFERRER_POLICY, HEADER_X_CONTENT_TYPE_OPTIONS,
    HEADER_X_DOWNLOAD_OPTIONS, HEADER_X_FRAME_OPTIONS, HEADER_X_PERMITTED_CROSS_DOMAIN_POLICIES,
    HEADER_X_XSS_PROTECTION,
};
use crate::error::ConfigurationError;
use crate::headers::{invalid, HeaderConfig, HeaderKey, RenderedHeader};
use std::borrow::Cow;

macro_rules! string_header {
    ($(#[$meta:meta])* $name:ident, $key:ident, $header:expr, $default:expr, $check:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<Cow<'static, str>>) -> Self {
                Self(value.into())
            }

            #[inline]
            pub fn value(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self(Cow::Borrowed($default))
            }
        }

        impl HeaderConfig for $name {
            const KEY: HeaderKey = HeaderKey::$key;

            fn validate(&self) -> Result<(), ConfigurationError> {
                $check(&self.0).map_err(|reason| invalid($header, reason))
            }

            #[inline]
            fn build(&self) -> Option<RenderedHeader> {
                Some(RenderedHeader::new($header, self.0.to_string()))
            }
        }
    };
}

string_header!(
    /// `Strict-Transport-Security`, e.g. `max-age=31536000; includeSubDomains`.
    Hsts,
    Hsts,
    HEADER_HSTS,
    "max-age=631138519",
    check_hsts
);
string_header!(
    XFrameOptions,
    XFrameOptions,
    HEADER_X_FRAME_OPTIONS,
    "sameorigin",
    check_frame_options
);
string_header!(
    XContentTypeOptions,
    XContentTypeOptions,
    HEADER_X_CONTENT_TYPE_OPTIONS,
    "nosniff",
    check_content_type_options
);
string_header!(
    XXssProtection,
    XXssProtection,
    HEADER_X_XSS_PROTECTION,
    "1; mode=block",
    check_xss_protection
);
string_header!(
    XDownloadOptions,
    XDownloadOptions,
    HEADER_X_DOWNLOAD_OPTIONS,
    "noopen",
    check_download_options
);
string_header!(
    XPermittedCrossDomainPolicies,
    XPermittedCrossDomainPolicies,
    HEADER_X_PERMITTED_CROSS_DOMAIN_POLICIES,
    "none",
    check_cross_domain_policies
);
string_header!(
    /// `Referrer-Policy`; a comma separated list of policy tokens is accepted.
    ReferrerPolicy,
    ReferrerPolicy,
    HEADER_REFERRER_POLICY,
    "strict-origin-when-cross-origin",
    check_referrer_policy
);

fn check_hsts(value: &str) -> Result<(), String> {
    let mut parts = value.split(';').map(str::trim);
    let max_age = parts
        .next()
        .and_then(|part| part.strip_prefix("max-age="))
        .ok_or_else(|| format!("{value:?} must start with max-age="))?;
    if max_age.is_empty() || !max_age.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("max-age {max_age:?} is not a number"));
    }
    for part in parts {
        if !part.eq_ignore_ascii_case("includesubdomains") && !part.eq_ignore_ascii_case("preload") {
            return Err(format!("unknown directive {part:?}"));
        }
    }
    Ok(())
}

fn check_frame_options(value: &str) -> Result<(), String> {
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "sameorigin" | "deny" => Ok(()),
        other if other.starts_with("allow-from ") && other.len() > "allow-from ".len() => Ok(()),
        _ => Err(format!("{value:?} is not sameorigin, deny or allow-from <uri>")),
    }
}

fn check_content_type_options(value: &str) -> Result<(), String> {
    one_of(value, &["nosniff"])
}

fn check_xss_protection(value: &str) -> Result<(), String> {
    let mut parts = value.split(';').map(str::trim);
    match parts.next() {
        Some("0") | Some("1") => {}
        _ => return Err(format!("{value:?} must start with 0 or 1")),
    }
    let mut seen_report = false;
    for part in parts {
        if part.eq_ignore_ascii_case("mode=block") && !seen_report {
            continue;
        }
        match part.strip_prefix("report=") {
            Some(uri) if !uri.is_empty() && !seen_report => seen_report = true,
            _ => return Err(format!("unexpected {part:?}")),
        }
    }
    Ok(())
}

fn check_download_options(value: &str) -> Result<(), String> {
    one_of(value, &["noopen"])
}

fn check_cross_domain_policies(value: &str) -> Result<(), String> {
    one_of(
        value,
        &["none", "master-only", "by-content-type", "by-ftp-filename", "all"],
    )
}

const REFERRER_POLICIES: &[&str] = &[
    "no-referrer",
    "no-referrer-when-downgrade",
    "same-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
    "origin",
    "origin-when-cross-origin",
    "unsafe-url",
];

fn check_referrer_policy(value: &str) -> Result<(), String> {
    value
        .split(',')
        .try_for_each(|token| one_of(token.trim(), REFERRER_POLICIES))
}

fn one_of(value: &str, allowed: &[&str]) -> Result<(), String> {
    if allowed.iter().any(|candidate| value.eq_ignore_ascii_case(candidate)) {
        Ok(())
    } else {
        Err(format!("{value:?} is not one of {}", allowed.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Hsts::default().validate().is_ok());
        assert!(XFrameOptions::default().validate().is_ok());
        assert!(XContentTypeOptions::default().validate().is_ok());
        assert!(XXssProtection::default().validate().is_ok());
        assert!(XDownloadOptions::default().validate().is_ok());
        assert!(XPermittedCrossDomainPolicies::default().validate().is_ok());
        assert!(ReferrerPolicy::default().validate().is_ok());
    }

    #[test]
    fn hsts_requires_max_age() {
        assert!(Hsts::new("max-age=10; includeSubDomains; preload").validate().is_ok());
        assert!(Hsts::new("includeSubDomains").validate().is_err());
        assert!(Hsts::new("max-age=abc").validate().is_err());
    }

    #[test]
    fn xss_protection_accepts_report() {
        assert!(XXssProtection::new("1; mode=block; report=/xss").validate().is_ok());
        assert!(XXssProtection::new("2").validate().is_err());
    }

    #[test]
    fn referrer_policy_accepts_fallback_lists() {
        assert!(ReferrerPolicy::new("no-referrer, strict-origin").validate().is_ok());
        assert!(ReferrerPolicy::new("sometimes").validate().is_err());
    }
}
