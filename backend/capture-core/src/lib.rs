//! Orchestration core of a document-capture SDK.
//!
//! Uploads captured pages, composes them into one document, runs analysis
//! and reports corrected extractions back as feedback, all through an
//! authenticated transport with a single-shot 401 refresh.

pub mod analysis;
pub mod cancellation;
pub mod config;
pub mod credentials;
pub mod documents;
pub mod error;
pub mod logger;
pub mod resource;
pub mod transport;

#[cfg(test)]
mod tests;

pub use analysis::{AnalysisState, DocumentService, ErrorSink, FeedbackOutcome, LogErrorSink};
pub use cancellation::CancellationToken;
pub use config::SdkConfig;
pub use credentials::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use error::{ApiError, ApiErrorKind, CoreError, DocumentServiceError};
pub use transport::Transport;

pub const SDK_NAME: &str = "capture-sdk";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SDK_USER_AGENT: &str = const_format::concatcp!(SDK_NAME, "/", SDK_VERSION);

pub const DEFAULT_API_HOST: &str = "api.gini.net";
pub const DEFAULT_USER_CENTER_HOST: &str = "user.gini.net";
pub const DEFAULT_API_BASE_URL: &str = const_format::concatcp!("https://", DEFAULT_API_HOST);
pub const DEFAULT_USER_CENTER_BASE_URL: &str =
    const_format::concatcp!("https://", DEFAULT_USER_CENTER_HOST);
