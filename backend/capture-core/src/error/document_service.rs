use crate::error::api::ApiError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors surfaced to the capture/review layer.
///
/// Transport failures pass through untouched; the remaining variants describe
/// calls the flow cannot honour in its current state.
#[derive(Debug, Clone, ThisError)]
pub enum DocumentServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No uploaded pages to analyse {location}")]
    NoDocuments { location: ErrorLocation },

    #[error("Analysis already in progress {location}")]
    AnalysisInProgress { location: ErrorLocation },

    #[error("Unsupported QR code: {message} {location}")]
    UnsupportedQrCode {
        message: String,
        location: ErrorLocation,
    },
}

impl DocumentServiceError {
    #[track_caller]
    pub fn no_documents() -> Self {
        DocumentServiceError::NoDocuments {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn analysis_in_progress() -> Self {
        DocumentServiceError::AnalysisInProgress {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unsupported_qr_code(message: impl Into<String>) -> Self {
        DocumentServiceError::UnsupportedQrCode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// True when the failure is a cancellation the caller should ignore.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DocumentServiceError::Api(error) if error.is_cancellation())
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            DocumentServiceError::Api(error) => Some(error),
            _ => None,
        }
    }
}
