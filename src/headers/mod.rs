pub mod cookies;
pub mod pins;
pub mod simple;

pub use cookies::{CookieConfig, SameSite};
pub use pins::PublicKeyPins;
pub use simple::{
    Hsts, ReferrerPolicy, XContentTypeOptions, XDownloadOptions, XFrameOptions,
    XPermittedCrossDomainPolicies, XXssProtection,
};

use crate::core::setting::Setting;
use crate::error::ConfigurationError;
use std::fmt;

/// A header ready to be written to a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedHeader {
    pub name: &'static str,
    pub value: String,
}

impl RenderedHeader {
    #[inline]
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Identifies a header slot of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeaderKey {
    Csp,
    CspReportOnly,
    Hsts,
    XFrameOptions,
    XContentTypeOptions,
    XXssProtection,
    XDownloadOptions,
    XPermittedCrossDomainPolicies,
    ReferrerPolicy,
    PublicKeyPins,
}

impl HeaderKey {
    #[inline]
    pub fn is_csp(self) -> bool {
        matches!(self, HeaderKey::Csp | HeaderKey::CspReportOnly)
    }

    /// Headers that only make sense over a secure transport.
    #[inline]
    pub fn https_only(self) -> bool {
        matches!(self, HeaderKey::Hsts | HeaderKey::PublicKeyPins)
    }
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Scheme of the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestScheme {
    Http,
    Https,
}

impl RequestScheme {
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("https") {
            RequestScheme::Https
        } else {
            RequestScheme::Http
        }
    }

    /// Whether the header identified by `key` may be sent for this scheme.
    #[inline]
    pub fn allows(self, key: HeaderKey) -> bool {
        self == RequestScheme::Https || !key.https_only()
    }
}

/// A non-CSP header configuration.
pub trait HeaderConfig {
    const KEY: HeaderKey;

    fn validate(&self) -> Result<(), ConfigurationError>;

    fn build(&self) -> Option<RenderedHeader>;
}

impl<T: HeaderConfig> Setting<T> {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.as_configured().map_or(Ok(()), T::validate)
    }

    #[inline]
    pub fn build(&self) -> Option<RenderedHeader> {
        self.as_configured().and_then(T::build)
    }
}

#[inline]
pub(crate) fn invalid(header: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidHeaderValue {
        header,
        reason: reason.into(),
    }
}
