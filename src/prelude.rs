pub use crate::core::{
    ConfigurationBuilder, Directive, Family, PolicyConfig, PolicyConfigBuilder, PolicyTarget,
    Registry, Setting, Source,
};
pub use crate::error::SecureHeadersError;
pub use crate::headers::{CookieConfig, HeaderKey, SameSite};
pub use crate::middleware::{secure_headers, SecureHeaders, SecureHeadersExt};
pub use crate::monitoring::HeaderStats;
pub use crate::security::{HashAlgorithm, HashGenerator, HashManifest};
