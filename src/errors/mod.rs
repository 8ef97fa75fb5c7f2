//! Centralized error handling for the VOD gateway
//!
//! The web layer owns the mapping from these types onto HTTP statuses and
//! response envelopes; everything below the handlers returns `AppResult`.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
