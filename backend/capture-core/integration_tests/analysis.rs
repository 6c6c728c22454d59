use super::helpers::{
    document_json, document_url, mount_composite, mount_document, mount_extractions, service,
    service_with_uploaded_pages, store_with_user_token,
};

use capture_core::error::{ApiErrorKind, DocumentServiceError};
use capture_core::{AnalysisState, DocumentService};

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Analysis flow tests
// ============================================================================

const COMPOSITE_ID: &str = "composite-1";

async fn mount_pending_composite(server: &MockServer) {
    mount_composite(server, COMPOSITE_ID).await;
    mount_document(server, COMPOSITE_ID, "PENDING").await;
}

/// Poll until the flow reaches the state `reached` accepts.
async fn wait_for_state(service: &DocumentService, reached: fn(&AnalysisState) -> bool) {
    for _ in 0..200 {
        if reached(&service.state()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("flow never reached the expected state, state: {:?}", service.state());
}

async fn wait_until_analyzing(service: &DocumentService) {
    wait_for_state(service, |state| matches!(state, AnalysisState::Analyzing)).await;
}

async fn wait_until_creating_composite(service: &DocumentService) {
    wait_for_state(service, |state| matches!(state, AnalysisState::CreatingComposite)).await;
}

/// **VALUE**: Verifies analysis without uploaded pages is rejected.
///
/// **WHY THIS MATTERS**: An empty composite is a server error; the UI must prompt for a page.
///
/// **BUG THIS CATCHES**: Would catch an empty composite being posted.
#[tokio::test]
async fn given_no_pages_when_start_analysis_then_no_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents/composite"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let service = service(&server, store_with_user_token());

    let error = service.start_analysis().await.expect_err("must fail");

    assert!(matches!(error, DocumentServiceError::NoDocuments { .. }));
    assert!(service.state().is_idle());
}

/// **VALUE**: Verifies polling continues through PENDING and returns the extractions.
///
/// **WHY THIS MATTERS**: Processing takes seconds; the first poll is almost always PENDING.
///
/// **BUG THIS CATCHES**: Would catch extractions fetched before processing finished.
#[tokio::test]
async fn given_pending_then_completed_when_start_analysis_then_completed_with_result() {
    // GIVEN: The composite is PENDING twice, then COMPLETED
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_composite(&server, COMPOSITE_ID).await;
    Mock::given(method("GET"))
        .and(path(format!("/documents/{COMPOSITE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(
            &server,
            COMPOSITE_ID,
            "PENDING",
        )))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_document(&server, COMPOSITE_ID, "COMPLETED").await;
    mount_extractions(&server, COMPOSITE_ID).await;

    // WHEN: Analyzing
    let result = service.start_analysis().await.expect("analysis should complete");

    // THEN: Result and state agree
    assert_eq!(
        result.extraction("amountToPay").map(|e| e.value.as_str()),
        Some("950.00:EUR")
    );
    assert_eq!(result.line_items().len(), 1);
    assert!(matches!(service.state(), AnalysisState::Completed(_)));
    assert_eq!(
        service.composite_document().map(|d| d.id),
        Some(COMPOSITE_ID.to_string())
    );
}

/// **VALUE**: Verifies a processing ERROR ends the flow in `Failed`.
///
/// **WHY THIS MATTERS**: The UI shows a retry option only for failed analyses.
///
/// **BUG THIS CATCHES**: Would catch ERROR being treated as pending forever.
#[tokio::test]
async fn given_processing_error_when_start_analysis_then_failed() {
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_composite(&server, COMPOSITE_ID).await;
    mount_document(&server, COMPOSITE_ID, "ERROR").await;

    let error = service.start_analysis().await.expect_err("must fail");

    assert_eq!(error.as_api().map(|e| e.kind()), Some(ApiErrorKind::Unknown));
    assert!(matches!(
        service.state(),
        AnalysisState::Failed(ref e) if e.kind() == ApiErrorKind::Unknown
    ));
}

/// **VALUE**: Verifies an extraction failure is surfaced and recorded.
///
/// **WHY THIS MATTERS**: The last step can still fail; the flow must not stay `Analyzing`.
///
/// **BUG THIS CATCHES**: Would catch the flow hanging after a failed extractions call.
#[tokio::test]
async fn given_extractions_fail_when_start_analysis_then_failed() {
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_composite(&server, COMPOSITE_ID).await;
    mount_document(&server, COMPOSITE_ID, "COMPLETED").await;
    Mock::given(method("GET"))
        .and(path(format!("/documents/{COMPOSITE_ID}/extractions")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let error = service.start_analysis().await.expect_err("must fail");

    assert!(!error.is_cancellation());
    assert!(matches!(service.state(), AnalysisState::Failed(_)));
}

/// **VALUE**: Verifies cancelling during analysis deletes the composite and returns to `Idle`.
///
/// **WHY THIS MATTERS**: Users leaving the review screen must not leave documents behind.
///
/// **BUG THIS CATCHES**: Would catch the composite surviving a cancel, or the analysis result
/// still being delivered.
#[tokio::test]
async fn given_analyzing_when_cancel_analysis_then_composite_deleted_and_idle() {
    // GIVEN: A composite that never finishes processing
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_pending_composite(&server).await;
    Mock::given(method("DELETE"))
        .and(path(format!("/documents/{COMPOSITE_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let runner = Arc::clone(&service);
    let analysis = tokio::spawn(async move { runner.start_analysis().await });
    wait_until_analyzing(&service).await;

    // WHEN: Cancelling
    service.cancel_analysis().await;

    // THEN: The run reports cancellation and the flow is idle
    let error = analysis.await.expect("task").expect_err("must be cancelled");
    assert!(error.is_cancellation());
    assert!(service.state().is_idle());
    assert!(service.composite_document().is_none());
}

/// **VALUE**: Verifies reset abandons a running analysis without remote deletes.
///
/// **WHY THIS MATTERS**: Reset starts a new session; cleanup of old documents is not its job.
///
/// **BUG THIS CATCHES**: Would catch a late completion overwriting the fresh state.
#[tokio::test]
async fn given_analyzing_when_reset_then_idle_and_pipeline_empty() {
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_pending_composite(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let runner = Arc::clone(&service);
    let analysis = tokio::spawn(async move { runner.start_analysis().await });
    wait_until_analyzing(&service).await;

    service.reset_to_initial_state();

    let error = analysis.await.expect("task").expect_err("must be cancelled");
    assert!(error.is_cancellation());
    assert!(service.state().is_idle());
    assert!(service.pipeline().partial_documents().is_empty());
}

/// **VALUE**: Verifies a second analysis is refused while one runs.
///
/// **WHY THIS MATTERS**: Two composites for the same pages would double the server work.
///
/// **BUG THIS CATCHES**: Would catch the running check being skipped.
#[tokio::test]
async fn given_analysis_running_when_started_again_then_analysis_in_progress() {
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    mount_pending_composite(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let runner = Arc::clone(&service);
    let analysis = tokio::spawn(async move { runner.start_analysis().await });
    wait_until_analyzing(&service).await;

    let error = service.start_analysis().await.expect_err("must be refused");
    assert!(matches!(error, DocumentServiceError::AnalysisInProgress { .. }));

    service.cancel_analysis().await;
    let _ = analysis.await;
}

/// **VALUE**: Verifies a cancel while the composite is being created deletes it on arrival.
///
/// **WHY THIS MATTERS**: The composite call cannot be recalled; once it lands, the document
/// it created must not be left on the server.
///
/// **BUG THIS CATCHES**: Would catch the late composite being analysed or kept.
#[tokio::test]
async fn given_creating_composite_when_cancelled_then_late_composite_deleted_and_idle() {
    // GIVEN: A slow composite call that succeeds
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    Mock::given(method("POST"))
        .and(path("/documents/composite"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", document_url(&server, COMPOSITE_ID).as_str())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_document(&server, COMPOSITE_ID, "COMPLETED").await;
    Mock::given(method("DELETE"))
        .and(path(format!("/documents/{COMPOSITE_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/documents/{COMPOSITE_ID}/extractions")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let runner = Arc::clone(&service);
    let analysis = tokio::spawn(async move { runner.start_analysis().await });
    wait_until_creating_composite(&service).await;

    // WHEN: Cancelling before the composite exists
    service.cancel_analysis().await;

    // THEN: The run reports cancellation, the composite is deleted, the flow is idle
    let error = analysis.await.expect("task").expect_err("must be cancelled");
    assert!(error.is_cancellation());
    assert!(service.state().is_idle());
    assert!(service.composite_document().is_none());
}

/// **VALUE**: Verifies a cancel followed by a failing composite call still ends `Idle`.
///
/// **WHY THIS MATTERS**: The user already left the screen; they must not be shown a server
/// error for work they cancelled, and the next analysis must be allowed to start.
///
/// **BUG THIS CATCHES**: Would catch the flow getting stuck in `Cancelled` or the transport
/// error reaching the caller.
#[tokio::test]
async fn given_creating_composite_when_cancelled_and_create_fails_then_cancelled_and_idle() {
    // GIVEN: A slow composite call that fails
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;
    Mock::given(method("POST"))
        .and(path("/documents/composite"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let runner = Arc::clone(&service);
    let analysis = tokio::spawn(async move { runner.start_analysis().await });
    wait_until_creating_composite(&service).await;

    // WHEN: Cancelling, then the composite call fails
    service.cancel_analysis().await;
    let error = analysis.await.expect("task").expect_err("must be cancelled");

    // THEN: request_cancelled and a flow that accepts a new run
    assert_eq!(
        error.as_api().map(|e| e.kind()),
        Some(ApiErrorKind::RequestCancelled)
    );
    assert!(service.state().is_idle());

    let retry = service.start_analysis().await.expect_err("composite still fails");
    assert!(!matches!(retry, DocumentServiceError::AnalysisInProgress { .. }));
}
