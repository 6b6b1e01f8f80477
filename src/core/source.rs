use crate::constants::{
    NONCE_PREFIX, NONE_SOURCE, REPORT_SAMPLE_SOURCE, SELF_SOURCE, STAR_SOURCE,
    STRICT_DYNAMIC_SOURCE, SUFFIX_QUOTE, UNSAFE_EVAL_SOURCE, UNSAFE_INLINE_SOURCE,
};
use crate::security::hash::HashAlgorithm;
use std::{borrow::Cow, fmt};

/// Typed source expression.
///
/// Policies store source expressions as plain strings. `Source` is a convenience for
/// producing correctly quoted tokens, e.g. `Source::Self_` renders as `'self'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    None,
    Self_,
    Any,
    UnsafeInline,
    UnsafeEval,
    StrictDynamic,
    ReportSample,
    Host(Cow<'static, str>),
    Scheme(Cow<'static, str>),
    Nonce(Cow<'static, str>),
    Hash {
        algorithm: HashAlgorithm,
        value: Cow<'static, str>,
    },
}

impl Source {
    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }

    #[inline]
    pub const fn as_static_str(&self) -> Option<&'static str> {
        match self {
            Source::None => Some(NONE_SOURCE),
            Source::Self_ => Some(SELF_SOURCE),
            Source::Any => Some(STAR_SOURCE),
            Source::UnsafeInline => Some(UNSAFE_INLINE_SOURCE),
            Source::UnsafeEval => Some(UNSAFE_EVAL_SOURCE),
            Source::StrictDynamic => Some(STRICT_DYNAMIC_SOURCE),
            Source::ReportSample => Some(REPORT_SAMPLE_SOURCE),
            _ => None,
        }
    }

    #[inline]
    pub fn host(host: impl Into<Cow<'static, str>>) -> Self {
        Source::Host(host.into())
    }

    #[inline]
    pub fn scheme(scheme: impl Into<Cow<'static, str>>) -> Self {
        Source::Scheme(scheme.into())
    }

    #[inline]
    pub fn nonce(nonce: impl Into<Cow<'static, str>>) -> Self {
        Source::Nonce(nonce.into())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.as_static_str() {
            return f.write_str(keyword);
        }
        match self {
            Source::Host(host) => f.write_str(host),
            Source::Scheme(scheme) => write!(f, "{}:", scheme),
            Source::Nonce(nonce) => write!(f, "{}{}{}", NONCE_PREFIX, nonce, SUFFIX_QUOTE),
            Source::Hash { algorithm, value } => {
                write!(f, "{}{}{}", algorithm.prefix(), value, SUFFIX_QUOTE)
            }
            _ => Ok(()),
        }
    }
}

impl From<Source> for String {
    #[inline]
    fn from(source: Source) -> Self {
        match source.as_static_str() {
            Some(keyword) => keyword.to_owned(),
            None => source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_quoted() {
        assert_eq!(String::from(Source::Self_), "'self'");
        assert_eq!(String::from(Source::None), "'none'");
        assert_eq!(String::from(Source::Any), "*");
    }

    #[test]
    fn nonce_and_hash_tokens() {
        assert_eq!(Source::nonce("abc").to_string(), "'nonce-abc'");
        let hash = Source::Hash {
            algorithm: HashAlgorithm::Sha384,
            value: "xyz=".into(),
        };
        assert_eq!(hash.to_string(), "'sha384-xyz='");
        assert_eq!(Source::scheme("data").to_string(), "data:");
    }
}
