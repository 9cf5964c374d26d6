//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the origin URL (scheme, host)
//! - Validate value ranges (port, body limits)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;
use crate::http::origin::Origin;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a deserialized config for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.origin.url.is_empty() {
        errors.push(ValidationError::new("origin.url", "proxy URL is required"));
    } else if let Err(e) = Origin::parse(&config.origin.url) {
        errors.push(ValidationError::new("origin.url", e.to_string()));
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "port must be non-zero"));
    }

    if !config.listener.context_path.starts_with('/') {
        errors.push(ValidationError::new(
            "listener.context_path",
            "context path must start with '/'",
        ));
    }

    if config.observability.response_body_limit == 0 {
        errors.push(ValidationError::new(
            "observability.response_body_limit",
            "limit must be non-zero",
        ));
    }
    if config.observability.request_body_limit == 0 {
        errors.push(ValidationError::new(
            "observability.request_body_limit",
            "limit must be non-zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
