use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

/// A policy or header configuration that cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("default_src is required unless the policy is opted out")]
    MissingDefaultSrc,

    #[error("Directive {0} has an empty source list, omit it instead")]
    EmptySourceList(String),

    #[error("Unknown directive: {0}")]
    UnknownDirective(String),

    #[error("Directive {directive} expects {expected}")]
    TypeMismatch {
        directive: String,
        expected: &'static str,
    },

    #[error("Directive {directive} contains deprecated unquoted keyword {keyword}, use '{keyword}'")]
    DeprecatedKeyword { directive: String, keyword: String },

    #[error("Meta value {0} must be a boolean")]
    InvalidMetaValue(String),

    #[error("Invalid {header} value: {reason}")]
    InvalidHeaderValue {
        header: &'static str,
        reason: String,
    },

    #[error("Hash manifest error: {0}")]
    Manifest(String),
}

/// A lifecycle rule was broken while mutating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Configuration {0} is frozen")]
    Frozen(String),

    #[error("{0} has a dynamic override, use the override or append API instead")]
    IllegalDirectModification(&'static str),

    #[error("Cannot merge directives into an opted-out policy")]
    OptOutMerge,
}

/// Lookups and registrations against the configuration registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Configuration {0} is not registered, configure a default first")]
    NotConfigured(String),

    #[error("Configuration {0} is already registered")]
    DuplicateConfiguration(String),

    #[error("Base configuration {0} not found")]
    BaseNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecureHeadersError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ResponseError for SecureHeadersError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
