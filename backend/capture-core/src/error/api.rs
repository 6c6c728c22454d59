//! Transport error taxonomy.
//!
//! Every failure of a remote call is classified into exactly one kind:
//! - HTTP status codes are classified directly (never parsed from strings)
//! - Responses are retained for diagnostics when one exists
//! - All errors include ErrorLocation for debugging
//! - `#[track_caller]` for automatic location capture

use crate::transport::response::HttpResponse;

use common::{ErrorLocation, HttpStatusCode};

use std::fmt;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Kind of an [`ApiError`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    BadRequest,
    NotAcceptable,
    NotFound,
    NoResponse,
    Parse,
    RequestCancelled,
    TooManyRequests,
    Unauthorized,
    Maintenance,
    Unknown,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::BadRequest => "bad_request",
            ApiErrorKind::NotAcceptable => "not_acceptable",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::NoResponse => "no_response",
            ApiErrorKind::Parse => "parse_error",
            ApiErrorKind::RequestCancelled => "request_cancelled",
            ApiErrorKind::TooManyRequests => "too_many_requests",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Maintenance => "maintenance",
            ApiErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the transport layer.
#[derive(Debug, Clone, ThisError)]
pub enum ApiError {
    #[error("Bad Request Error: {response} {location}")]
    BadRequest {
        response: HttpResponse,
        location: ErrorLocation,
    },

    #[error("Not Acceptable Error: {response} {location}")]
    NotAcceptable {
        response: HttpResponse,
        location: ErrorLocation,
    },

    #[error("Not Found Error: {response} {location}")]
    NotFound {
        response: HttpResponse,
        location: ErrorLocation,
    },

    #[error("No Response Error: {message} {location}")]
    NoResponse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Parse Error: {message} {location}")]
    Parse {
        message: String,
        response: Option<HttpResponse>,
        location: ErrorLocation,
    },

    #[error("Request Cancelled {location}")]
    RequestCancelled { location: ErrorLocation },

    #[error("Too Many Requests Error: {response} {location}")]
    TooManyRequests {
        response: HttpResponse,
        location: ErrorLocation,
    },

    #[error("Unauthorized Error: {message} {location}")]
    Unauthorized {
        message: String,
        response: Option<HttpResponse>,
        location: ErrorLocation,
    },

    #[error("Maintenance Error: {response} {location}")]
    Maintenance {
        response: HttpResponse,
        location: ErrorLocation,
    },

    #[error("Unknown Error: {message} {location}")]
    Unknown {
        message: String,
        response: Option<HttpResponse>,
        location: ErrorLocation,
    },
}

impl ApiError {
    /// Classify a response outside the decodable 200..400 range.
    #[track_caller]
    pub fn from_response(response: HttpResponse) -> Self {
        let location = ErrorLocation::from(Location::caller());

        match response.status {
            HttpStatusCode::BAD_REQUEST => ApiError::BadRequest { response, location },
            HttpStatusCode::UNAUTHORIZED => ApiError::Unauthorized {
                message: format!("HTTP {}", response.status),
                response: Some(response),
                location,
            },
            HttpStatusCode::NOT_FOUND => ApiError::NotFound { response, location },
            HttpStatusCode::NOT_ACCEPTABLE => ApiError::NotAcceptable { response, location },
            HttpStatusCode::TOO_MANY_REQUESTS => ApiError::TooManyRequests { response, location },
            HttpStatusCode::SERVICE_UNAVAILABLE => ApiError::Maintenance { response, location },
            status => ApiError::Unknown {
                message: format!("Unexpected HTTP status {status}"),
                response: Some(response),
                location,
            },
        }
    }

    #[track_caller]
    pub fn cancelled() -> Self {
        ApiError::RequestCancelled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_response(message: impl Into<String>) -> Self {
        ApiError::NoResponse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn parse(message: impl Into<String>, response: Option<HttpResponse>) -> Self {
        ApiError::Parse {
            message: message.into(),
            response,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            response: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown {
            message: message.into(),
            response: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::BadRequest { .. } => ApiErrorKind::BadRequest,
            ApiError::NotAcceptable { .. } => ApiErrorKind::NotAcceptable,
            ApiError::NotFound { .. } => ApiErrorKind::NotFound,
            ApiError::NoResponse { .. } => ApiErrorKind::NoResponse,
            ApiError::Parse { .. } => ApiErrorKind::Parse,
            ApiError::RequestCancelled { .. } => ApiErrorKind::RequestCancelled,
            ApiError::TooManyRequests { .. } => ApiErrorKind::TooManyRequests,
            ApiError::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            ApiError::Maintenance { .. } => ApiErrorKind::Maintenance,
            ApiError::Unknown { .. } => ApiErrorKind::Unknown,
        }
    }

    /// `request_cancelled` means "nothing to report", never a user-facing failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ApiError::RequestCancelled { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// The HTTP response that produced this error, if any.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ApiError::BadRequest { response, .. }
            | ApiError::NotAcceptable { response, .. }
            | ApiError::NotFound { response, .. }
            | ApiError::TooManyRequests { response, .. }
            | ApiError::Maintenance { response, .. } => Some(response),
            ApiError::Parse { response, .. }
            | ApiError::Unauthorized { response, .. }
            | ApiError::Unknown { response, .. } => response.as_ref(),
            ApiError::NoResponse { .. } | ApiError::RequestCancelled { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|r| r.status.0)
    }

    /// Raw response body, for diagnostics.
    pub fn raw_body(&self) -> Option<String> {
        self.response().map(HttpResponse::body_text)
    }
}

impl From<reqwest::Error> for ApiError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        ApiError::NoResponse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for ApiError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        ApiError::Unknown {
            message: format!("Malformed URL: {error}"),
            response: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
