pub(crate) const HEADER_CSP: &str = "Content-Security-Policy";
pub(crate) const HEADER_CSP_REPORT_ONLY: &str = "Content-Security-Policy-Report-Only";
pub(crate) const HEADER_HSTS: &str = "Strict-Transport-Security";
pub(crate) const HEADER_X_FRAME_OPTIONS: &str = "X-Frame-Options";
pub(crate) const HEADER_X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub(crate) const HEADER_X_XSS_PROTECTION: &str = "X-XSS-Protection";
pub(crate) const HEADER_X_DOWNLOAD_OPTIONS: &str = "X-Download-Options";
pub(crate) const HEADER_X_PERMITTED_CROSS_DOMAIN_POLICIES: &str =
    "X-Permitted-Cross-Domain-Policies";
pub(crate) const HEADER_REFERRER_POLICY: &str = "Referrer-Policy";
pub(crate) const HEADER_PUBLIC_KEY_PINS: &str = "Public-Key-Pins";
pub(crate) const HEADER_PUBLIC_KEY_PINS_REPORT_ONLY: &str = "Public-Key-Pins-Report-Only";

/// Name of the configuration registered by [`Registry::configure`](crate::Registry::configure).
pub const DEFAULT_CONFIG: &str = "default";
/// Name of the auto-registered configuration that emits no headers at all.
pub const OPT_OUT_CONFIG: &str = "opt_out_of_all_protection";
/// JSON token standing in for an opted-out header.
pub const OPT_OUT: &str = "opt_out";

pub(crate) const META_REPORT_ONLY: &str = "report_only";
pub(crate) const META_PRESERVE_SCHEMES: &str = "preserve_schemes";

pub(crate) const NONE_SOURCE: &str = "'none'";
pub(crate) const SELF_SOURCE: &str = "'self'";
pub(crate) const UNSAFE_INLINE_SOURCE: &str = "'unsafe-inline'";
pub(crate) const UNSAFE_EVAL_SOURCE: &str = "'unsafe-eval'";
pub(crate) const STRICT_DYNAMIC_SOURCE: &str = "'strict-dynamic'";
pub(crate) const REPORT_SAMPLE_SOURCE: &str = "'report-sample'";
pub(crate) const STAR_SOURCE: &str = "*";
pub(crate) const NONCE_PREFIX: &str = "'nonce-";
pub(crate) const HASH_PREFIX_SHA256: &str = "'sha256-";
pub(crate) const HASH_PREFIX_SHA384: &str = "'sha384-";
pub(crate) const HASH_PREFIX_SHA512: &str = "'sha512-";
pub(crate) const SUFFIX_QUOTE: &str = "'";

/// Legacy keyword spellings that must be written quoted.
pub(crate) const DEPRECATED_KEYWORDS: &[&str] = &["self", "none", "eval", "inline"];

pub(crate) const DEFAULT_NONCE_LENGTH: usize = 32;
pub(crate) const NONCE_BUFFER_POOL_SIZE: usize = 32;
pub(crate) const SEMICOLON_SPACE: &str = "; ";

pub(crate) const HASH_FILE_ENV: &str = "SECURE_HEADERS_HASH_FILE";
pub(crate) const DEFAULT_HASH_FILE: &str = "config/secure_headers_generated_hashes.json";
