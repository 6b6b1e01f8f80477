pub mod constants;
pub mod core;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod monitoring;
pub mod prelude;
pub mod security;
pub mod useragent;

// Re-export commonly used types for convenience
pub use self::core::{
    Configuration, ConfigurationBuilder, Directive, DirectiveValue, Family, PolicyConfig,
    PolicyConfigBuilder, PolicyTarget, Registry, Setting, Source,
};
pub use error::{ConfigurationError, RegistryError, SecureHeadersError, StateError};
pub use headers::{HeaderKey, RenderedHeader, RequestScheme};
pub use middleware::{configure_secure_headers, secure_headers, SecureHeaders, SecureHeadersExt};
pub use monitoring::HeaderStats;
pub use security::{HashAlgorithm, HashGenerator, HashManifest, NonceGenerator};
