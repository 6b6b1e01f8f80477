use crate::constants::{DEFAULT_CONFIG, OPT_OUT_CONFIG};
use crate::core::config::{ConfigurationBuilder, PolicyTarget};
use crate::core::policy::PolicyConfig;
use crate::error::{RegistryError, SecureHeadersError};
use crate::headers::HeaderKey;
use crate::middleware::secure_headers::RequestSecureHeaders;
use crate::security::hash::{HashAlgorithm, HashGenerator};
use actix_web::HttpMessage;

/// Per-request secure headers controls for handlers.
///
/// Every method fails with [`RegistryError::NotConfigured`] when the request did
/// not pass through [`SecureHeaders`](crate::middleware::SecureHeaders).
pub trait SecureHeadersExt {
    /// Runs `f` against this request's configuration copy.
    fn with_secure_headers<R, F>(&self, f: F) -> Result<R, SecureHeadersError>
    where
        F: FnOnce(&mut ConfigurationBuilder) -> Result<R, SecureHeadersError>;

    fn override_content_security_policy_directives(
        &self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<(), SecureHeadersError>;

    fn append_content_security_policy_directives(
        &self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<(), SecureHeadersError>;

    /// Nonce for inline scripts, added to `script-src`. Stable within a request.
    fn content_security_policy_script_nonce(&self) -> Result<String, SecureHeadersError>;

    /// Nonce for inline styles, added to `style-src`. Stable within a request.
    fn content_security_policy_style_nonce(&self) -> Result<String, SecureHeadersError>;

    fn opt_out_of_header(&self, key: HeaderKey) -> Result<(), SecureHeadersError>;

    /// Replaces this request's configuration with a copy of the one registered as
    /// `name`. Changes made earlier in the request are discarded.
    fn use_secure_headers_override(&self, name: &str) -> Result<(), SecureHeadersError>;

    #[inline]
    fn opt_out_of_all_protection(&self) -> Result<(), SecureHeadersError> {
        self.use_secure_headers_override(OPT_OUT_CONFIG)
    }

    fn generate_hash_source(&self, algorithm: HashAlgorithm, data: &[u8]) -> String {
        HashGenerator::generate_source(algorithm, data).into()
    }
}

impl<T> SecureHeadersExt for T
where
    T: HttpMessage,
{
    fn with_secure_headers<R, F>(&self, f: F) -> Result<R, SecureHeadersError>
    where
        F: FnOnce(&mut ConfigurationBuilder) -> Result<R, SecureHeadersError>,
    {
        with_state(self, |state| f(&mut state.builder))
    }

    fn override_content_security_policy_directives(
        &self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<(), SecureHeadersError> {
        with_state(self, |state| {
            state.builder.override_directives(additions, target)?;
            state.overrides += 1;
            Ok(())
        })
    }

    fn append_content_security_policy_directives(
        &self,
        additions: &PolicyConfig,
        target: PolicyTarget,
    ) -> Result<(), SecureHeadersError> {
        with_state(self, |state| {
            state.builder.append_directives(additions, target)?;
            state.overrides += 1;
            Ok(())
        })
    }

    fn content_security_policy_script_nonce(&self) -> Result<String, SecureHeadersError> {
        with_state(self, |state| {
            let nonces = state.nonces.clone();
            Ok(state.builder.script_nonce(&nonces))
        })
    }

    fn content_security_policy_style_nonce(&self) -> Result<String, SecureHeadersError> {
        with_state(self, |state| {
            let nonces = state.nonces.clone();
            Ok(state.builder.style_nonce(&nonces))
        })
    }

    fn opt_out_of_header(&self, key: HeaderKey) -> Result<(), SecureHeadersError> {
        with_state(self, |state| {
            state.builder.opt_out(key);
            Ok(())
        })
    }

    fn use_secure_headers_override(&self, name: &str) -> Result<(), SecureHeadersError> {
        with_state(self, |state| {
            state.builder = state.registry.duplicate(name)?;
            state.overrides += 1;
            Ok(())
        })
    }
}

fn with_state<T, R, F>(message: &T, f: F) -> Result<R, SecureHeadersError>
where
    T: HttpMessage,
    F: FnOnce(&mut RequestSecureHeaders) -> Result<R, SecureHeadersError>,
{
    let mut extensions = message.extensions_mut();
    let state = extensions
        .get_mut::<RequestSecureHeaders>()
        .ok_or_else(|| RegistryError::NotConfigured(DEFAULT_CONFIG.to_string()))?;
    f(state)
}
