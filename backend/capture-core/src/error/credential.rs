use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CredentialStoreError {
    #[error("Credential Store Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Credential Store Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Credential Store Format Error: {path}: {reason} {location}")]
    Format {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Credential Store Value Error: {message} {location}")]
    Value {
        message: String,
        location: ErrorLocation,
    },
}
