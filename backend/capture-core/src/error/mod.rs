pub mod api;
pub mod config;
pub mod credential;
pub mod document_service;
pub mod logger;

pub use api::{ApiError, ApiErrorKind};
pub use config::ConfigError;
pub use credential::CredentialStoreError;
pub use document_service::DocumentServiceError;
pub use logger::LoggerError;

use thiserror::Error;

/// Errors raised while wiring the SDK together.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    CredentialStore(#[from] CredentialStoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
