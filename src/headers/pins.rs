use crate::constants::{HEADER_PUBLIC_KEY_PINS, HEADER_PUBLIC_KEY_PINS_REPORT_ONLY};
use crate::error::ConfigurationError;
use crate::headers::{invalid, HeaderConfig, HeaderKey, RenderedHeader};
use std::fmt::Write;
use url::Url;

/// `Public-Key-Pins` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKeyPins {
    pub pins: Vec<String>,
    pub max_age: u64,
    pub include_subdomains: bool,
    pub report_uri: Option<String>,
    pub report_only: bool,
}

impl PublicKeyPins {
    pub fn new<I, S>(pins: I, max_age: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pins: pins.into_iter().map(Into::into).collect(),
            max_age,
            include_subdomains: false,
            report_uri: None,
            report_only: false,
        }
    }

    #[inline]
    pub fn include_subdomains(mut self, enabled: bool) -> Self {
        self.include_subdomains = enabled;
        self
    }

    #[inline]
    pub fn report_uri(mut self, uri: impl Into<String>) -> Self {
        self.report_uri = Some(uri.into());
        self
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    #[inline]
    fn header_name(&self) -> &'static str {
        if self.report_only {
            HEADER_PUBLIC_KEY_PINS_REPORT_ONLY
        } else {
            HEADER_PUBLIC_KEY_PINS
        }
    }
}

impl HeaderConfig for PublicKeyPins {
    const KEY: HeaderKey = HeaderKey::PublicKeyPins;

    fn validate(&self) -> Result<(), ConfigurationError> {
        let name = self.header_name();
        if self.pins.is_empty() {
            return Err(invalid(name, "at least one pin is required"));
        }
        if let Some(pin) = self.pins.iter().find(|pin| pin.is_empty() || pin.contains('"')) {
            return Err(invalid(name, format!("malformed pin {pin:?}")));
        }
        if let Some(uri) = &self.report_uri {
            Url::parse(uri).map_err(|err| invalid(name, format!("report_uri {uri:?}: {err}")))?;
        }
        Ok(())
    }

    fn build(&self) -> Option<RenderedHeader> {
        let mut value = String::with_capacity(64 * self.pins.len() + 32);
        for pin in &self.pins {
            let _ = write!(value, "pin-sha256=\"{pin}\"; ");
        }
        let _ = write!(value, "max-age={}", self.max_age);
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if let Some(uri) = &self.report_uri {
            let _ = write!(value, "; report-uri=\"{uri}\"");
        }
        Some(RenderedHeader::new(self.header_name(), value))
    }
}
