//! HTTP request handlers.

/// Paste endpoints.
pub mod paste;
/// Short URL endpoints and short-link resolution.
pub mod short_url;
/// View statistics endpoints.
pub mod stats;
/// User endpoints.
pub mod user;
