//! HTTP request handlers organized by domain
//!
//! All handlers are thin wrappers around the service layer, focusing on
//! HTTP concerns: extraction, status codes, and response mapping.

pub mod analytics;
pub mod health;
pub mod live;
pub mod stream;
pub mod trending;
pub mod videos;
