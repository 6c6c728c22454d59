//! Shared primitives for the capture SDK.
//!
//! This crate holds the small building blocks every other crate leans on:
//! error locations, HTTP status helpers and redacted secret values. It has
//! no knowledge of the remote service or of documents.
//!
//! ## Architecture
//!
//! - **common** (this crate): Primitives with no business logic
//! - **models**: Pure data structures exchanged with the extraction service
//! - **capture-core**: Transport, composition pipeline and analysis flow

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
