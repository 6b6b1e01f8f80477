pub mod extensions;
pub mod secure_headers;

pub use extensions::SecureHeadersExt;
pub use secure_headers::{
    configure_secure_headers, secure_headers, RequestSecureHeaders, SecureHeaders,
    SecureHeadersService,
};
