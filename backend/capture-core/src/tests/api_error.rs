use crate::error::{ApiError, ApiErrorKind};
use crate::transport::response::HttpResponse;

/// **VALUE**: Verifies each non-decodable status maps to its error kind.
///
/// **WHY THIS MATTERS**: Callers branch on the kind (maintenance banner, rate limit backoff,
/// missing document). A wrong mapping shows the wrong message or retries the wrong thing.
///
/// **BUG THIS CATCHES**: Would catch 503 falling into `unknown` or 406 being read as 404.
#[test]
fn given_error_statuses_when_classified_then_kinds_match_table() {
    let cases = [
        (400_u16, ApiErrorKind::BadRequest),
        (401, ApiErrorKind::Unauthorized),
        (404, ApiErrorKind::NotFound),
        (406, ApiErrorKind::NotAcceptable),
        (429, ApiErrorKind::TooManyRequests),
        (503, ApiErrorKind::Maintenance),
        (500, ApiErrorKind::Unknown),
        (418, ApiErrorKind::Unknown),
    ];

    for (status, expected) in cases {
        // GIVEN: A response with the status
        let response = HttpResponse::new(status, format!("body {status}"));

        // WHEN: Classifying
        let error = ApiError::from_response(response);

        // THEN: Kind matches and the response is retained
        assert_eq!(error.kind(), expected, "status {status}");
        assert_eq!(error.status_code(), Some(status));
        assert_eq!(error.raw_body(), Some(format!("body {status}")));
    }
}

/// **VALUE**: Verifies cancellation is recognizable and carries no response.
///
/// **WHY THIS MATTERS**: `request_cancelled` must be silently ignored by callers.
///
/// **BUG THIS CATCHES**: Would catch `is_cancellation` matching other kinds.
#[test]
fn given_cancelled_error_when_inspected_then_is_cancellation_without_response() {
    let cancelled = ApiError::cancelled();
    assert!(cancelled.is_cancellation());
    assert!(cancelled.response().is_none());
    assert_eq!(cancelled.kind().as_str(), "request_cancelled");

    assert!(!ApiError::unknown("boom").is_cancellation());
    assert!(!ApiError::no_response("refused").is_cancellation());
}

/// **VALUE**: Verifies the error message format used across the crate.
///
/// **WHY THIS MATTERS**: Logs are grepped by the "<Kind> Error:" prefix.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops the location or message.
#[test]
fn given_parse_error_when_displayed_then_prefix_message_and_location() {
    let error = ApiError::parse("expected value", Some(HttpResponse::new(200_u16, "oops")));
    let display = error.to_string();

    assert!(display.starts_with("Parse Error: expected value"), "{display}");
    assert!(display.contains("api_error.rs"), "{display}");
    assert_eq!(error.raw_body().as_deref(), Some("oops"));
}
