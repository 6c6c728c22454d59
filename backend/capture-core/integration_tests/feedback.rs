use super::helpers::{
    mount_composite, mount_document, mount_extractions, mount_partial, page, service,
    store_with_user_token, test_config,
};

use capture_core::error::ApiErrorKind;
use capture_core::{ApiError, DocumentService, ErrorSink, FeedbackOutcome};

use models::{Extraction, Feedback};

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Feedback tests
// ============================================================================

const COMPOSITE_ID: &str = "composite-1";
const FEEDBACK_PATH: &str = "/documents/composite-1/extractions/feedback";

#[derive(Default)]
struct RecordingSink {
    errors: Mutex<Vec<(ApiErrorKind, String)>>,
}

impl RecordingSink {
    fn recorded(&self) -> Vec<(ApiErrorKind, String)> {
        self.errors.lock().expect("sink lock").clone()
    }
}

impl ErrorSink for RecordingSink {
    fn handle(&self, error: &ApiError, context: &str) {
        self.errors
            .lock()
            .expect("sink lock")
            .push((error.kind(), context.to_string()));
    }
}

/// Service with one analysed page, reporting to `sink`.
async fn analysed_service(server: &MockServer, sink: Arc<RecordingSink>) -> Arc<DocumentService> {
    analysed_service_with_delay(server, sink, Duration::from_millis(10)).await
}

async fn analysed_service_with_delay(
    server: &MockServer,
    sink: Arc<RecordingSink>,
    retry_delay: Duration,
) -> Arc<DocumentService> {
    mount_partial(server, b"page-one", "partial-1", Duration::ZERO).await;
    mount_composite(server, COMPOSITE_ID).await;
    mount_document(server, COMPOSITE_ID, "COMPLETED").await;
    mount_extractions(server, COMPOSITE_ID).await;

    let mut config = test_config(server);
    config.analysis.feedback_retry_delay = retry_delay;

    let service = DocumentService::from_config(&config, store_with_user_token())
        .expect("service should build")
        .with_error_sink(sink);
    let service = Arc::new(service);

    service
        .upload(&page("p1", b"page-one"), None)
        .await
        .expect("upload");
    service.start_analysis().await.expect("analysis");
    service
}

fn corrected_amount() -> Feedback {
    Feedback::new([Extraction::new("amountToPay", "amount", "900.00:EUR")])
}

/// **VALUE**: Verifies N retries mean N + 1 attempts, then one report to the error sink.
///
/// **WHY THIS MATTERS**: Feedback improves extraction quality; it is worth retrying, but
/// never forever, and a final failure must be visible.
///
/// **BUG THIS CATCHES**: Would catch off-by-one retry counts or silently dropped failures.
#[tokio::test]
async fn given_feedback_always_fails_when_sent_with_retries_then_exhausted_and_reported() {
    // GIVEN: Feedback always answered with 500
    let server = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let service = analysed_service(&server, sink.clone()).await;
    Mock::given(method("PUT"))
        .and(path(FEEDBACK_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    // WHEN: Sending with two retries
    let outcome = service.send_feedback(&corrected_amount(), 2).await;

    // THEN: Three attempts, one report, flow reset
    assert_eq!(outcome, FeedbackOutcome::Exhausted { attempts: 3 });
    let recorded = sink.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, ApiErrorKind::Unknown);
    assert!(service.state().is_idle());
    assert!(service.composite_document().is_none());
}

/// **VALUE**: Verifies a transient failure is retried until it succeeds.
///
/// **WHY THIS MATTERS**: Flaky mobile networks drop single requests all the time.
///
/// **BUG THIS CATCHES**: Would catch success on a retry being reported as failure.
#[tokio::test]
async fn given_first_attempt_fails_when_sent_then_sent_on_second_attempt() {
    let server = MockServer::start().await;
    let sink = Arc::new(RecordingSink::default());
    let service = analysed_service(&server, sink.clone()).await;
    Mock::given(method("PUT"))
        .and(path(FEEDBACK_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FEEDBACK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service.send_feedback(&corrected_amount(), 3).await;

    assert_eq!(outcome, FeedbackOutcome::Sent { attempts: 2 });
    assert!(sink.recorded().is_empty());
}

/// **VALUE**: Verifies feedback without an analysed document is skipped without traffic.
///
/// **WHY THIS MATTERS**: QR-code results have no remote document to attach feedback to.
///
/// **BUG THIS CATCHES**: Would catch a PUT against a missing document id.
#[tokio::test]
async fn given_no_analysed_document_when_sending_feedback_then_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let service = service(&server, store_with_user_token());

    let outcome = service.send_feedback(&corrected_amount(), 3).await;

    assert_eq!(outcome, FeedbackOutcome::Skipped);
    assert!(service.state().is_idle());
}

/// **VALUE**: Verifies retries wait the configured fixed delay between attempts.
///
/// **WHY THIS MATTERS**: Hammering a struggling server with instant retries makes an outage
/// worse and burns the retry budget in milliseconds.
///
/// **BUG THIS CATCHES**: Would catch the delay being ignored or applied only once.
#[tokio::test]
async fn given_retry_delay_when_feedback_keeps_failing_then_each_retry_waits_the_delay() {
    // GIVEN: A 150 ms retry delay and a failing feedback endpoint
    let server = MockServer::start().await;
    let retry_delay = Duration::from_millis(150);
    let sink = Arc::new(RecordingSink::default());
    let service = analysed_service_with_delay(&server, sink, retry_delay).await;
    Mock::given(method("PUT"))
        .and(path(FEEDBACK_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    // WHEN: Sending with two retries
    let started = Instant::now();
    let outcome = service.send_feedback(&corrected_amount(), 2).await;

    // THEN: At least two full delays elapsed
    assert_eq!(outcome, FeedbackOutcome::Exhausted { attempts: 3 });
    assert!(
        started.elapsed() >= retry_delay * 2,
        "elapsed {:?} is shorter than two retry delays",
        started.elapsed()
    );
}
