//! Error type definitions for the VOD gateway
//!
//! A single `AppError` covers every layer. Variants map 1:1 onto the wire
//! taxonomy: authorization failures, invalid input with a stable machine
//! readable code, missing resources, conflicts, upstream relay failures,
//! and internal faults that must never leak detail to clients.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Token signing failures (verification failures map to `Unauthorized`)
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Missing, malformed, expired, or mis-scoped credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but lacking the required role
    #[error("Forbidden")]
    Forbidden,

    /// Client input rejected; `code` is the stable wire identifier
    #[error("Invalid input ({code}): {message}")]
    InvalidInput { code: &'static str, message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// State conflicts, e.g. unique constraint collisions
    #[error("Conflict ({code})")]
    Conflict { code: &'static str },

    /// Upstream origin returned a non-relayable status or failed to respond
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create an invalid input error carrying a stable wire code
    pub fn invalid_input<M: Into<String>>(code: &'static str, message: M) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error carrying a stable wire code
    pub fn conflict(code: &'static str) -> Self {
        Self::Conflict { code }
    }

    /// Create an upstream unavailable error
    pub fn upstream<M: Into<String>>(message: M) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<M: Into<String>>(message: M) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code serialized into error envelopes
    pub fn wire_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::InvalidInput { code, .. } => code,
            Self::NotFound { .. } => "not_found",
            Self::Conflict { code } => code,
            Self::UpstreamUnavailable { .. } => "upstream_failed",
            Self::Database(_) | Self::Token(_) | Self::Configuration { .. } | Self::Internal { .. } => {
                "internal_error"
            }
        }
    }
}
