use crate::error::ConfigurationError;
use crate::headers::invalid;
use std::fmt;

const SET_COOKIE: &str = "Set-Cookie";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes injected into every `Set-Cookie` header of a response.
///
/// Attributes already present on a cookie are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieConfig {
    pub secure: bool,
    pub httponly: bool,
    pub samesite: Option<SameSite>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: true,
            httponly: true,
            samesite: Some(SameSite::Lax),
        }
    }
}

impl CookieConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.samesite == Some(SameSite::None) && !self.secure {
            return Err(invalid(SET_COOKIE, "SameSite=None requires the secure flag"));
        }
        Ok(())
    }

    /// Adds the configured flags to a raw `Set-Cookie` value. `Secure` is only added
    /// for requests served over HTTPS.
    pub fn apply(&self, cookie: &str, https: bool) -> String {
        let present = |attribute: &str| {
            cookie.split(';').skip(1).any(|part| {
                let name = part.split('=').next().unwrap_or_default().trim();
                name.eq_ignore_ascii_case(attribute)
            })
        };

        let mut value = cookie.trim_end_matches([';', ' ']).to_string();
        if self.secure && https && !present("secure") {
            value.push_str("; Secure");
        }
        if self.httponly && !present("httponly") {
            value.push_str("; HttpOnly");
        }
        if let Some(samesite) = self.samesite {
            if !present("samesite") {
                value.push_str("; SameSite=");
                value.push_str(&samesite.to_string());
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_appended_once() {
        let config = CookieConfig::default();
        assert_eq!(
            config.apply("session=abc; Path=/", true),
            "session=abc; Path=/; Secure; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            config.apply("session=abc; secure; SameSite=Strict", true),
            "session=abc; secure; SameSite=Strict; HttpOnly"
        );
    }

    #[test]
    fn secure_is_skipped_over_plain_http() {
        let config = CookieConfig::default();
        assert_eq!(config.apply("id=1", false), "id=1; HttpOnly; SameSite=Lax");
    }

    #[test]
    fn samesite_none_requires_secure() {
        let config = CookieConfig {
            secure: false,
            httponly: true,
            samesite: Some(SameSite::None),
        };
        assert!(config.validate().is_err());
    }
}
