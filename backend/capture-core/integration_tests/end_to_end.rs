use super::helpers::{
    document_url, mount_composite, mount_document, mount_extractions, page, service,
    service_with_uploaded_pages, store_with_user_token,
};

use capture_core::{AnalysisState, FeedbackOutcome};

use models::{Feedback, PageId};

use std::time::Duration;

use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Capture session from first upload to feedback
// ============================================================================

/// **VALUE**: Verifies a full session: two pages, reorder, analysis, corrected feedback.
///
/// **WHY THIS MATTERS**: This is the path every invoice takes in production.
///
/// **BUG THIS CATCHES**: Would catch the composite ignoring the user's order, or feedback
/// sent for the wrong document.
#[tokio::test]
async fn given_two_pages_when_reordered_analysed_and_corrected_then_feedback_sent() {
    // GIVEN: Two uploaded pages
    let server = MockServer::start().await;
    let service = service_with_uploaded_pages(&server).await;

    // WHEN: Swapping the pages
    service.reorder(&[PageId::from("p2"), PageId::from("p1")]);

    // THEN: The composite lists p2 first
    let info = service.pipeline().build_composite_info();
    let urls: Vec<Option<String>> =
        info.partial_documents.iter().map(|p| p.document_url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            Some(document_url(&server, "partial-2")),
            Some(document_url(&server, "partial-1")),
        ]
    );

    // GIVEN: The composite call expects that order
    Mock::given(method("POST"))
        .and(path("/documents/composite"))
        .and(body_partial_json(serde_json::json!({
            "partialDocuments": [
                { "document": document_url(&server, "partial-2") },
                { "document": document_url(&server, "partial-1") }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", document_url(&server, "composite-1").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_document(&server, "composite-1", "COMPLETED").await;
    mount_extractions(&server, "composite-1").await;

    // WHEN: Analyzing
    let result = service.start_analysis().await.expect("analysis should complete");

    // THEN: The amount is extracted
    assert_eq!(
        result.extraction("amountToPay").map(|e| e.value.as_str()),
        Some("950.00:EUR")
    );
    assert!(matches!(service.state(), AnalysisState::Completed(_)));

    // GIVEN: Feedback carrying the corrected amount
    Mock::given(method("PUT"))
        .and(path("/documents/composite-1/extractions/feedback"))
        .and(body_string_contains("\"value\":\"900.00:EUR\""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let mut feedback = Feedback::from_result(&result);
    assert!(feedback.correct("amountToPay", "900.00:EUR"));

    // WHEN: Sending feedback
    let outcome = service.send_feedback(&feedback, 3).await;

    // THEN: Sent at once, session back to the start
    assert_eq!(outcome, FeedbackOutcome::Sent { attempts: 1 });
    assert!(service.state().is_idle());
    assert!(service.pipeline().partial_documents().is_empty());
}

/// **VALUE**: Verifies single-page mode uploads and analyses in one call.
///
/// **WHY THIS MATTERS**: Receipts are captured as one page and analysed immediately.
///
/// **BUG THIS CATCHES**: Would catch analysis starting before the upload was recorded.
#[tokio::test]
async fn given_single_page_when_upload_and_analyze_then_result_returned() {
    let server = MockServer::start().await;
    super::helpers::mount_partial(&server, b"receipt", "partial-9", Duration::ZERO).await;
    mount_composite(&server, "composite-9").await;
    mount_document(&server, "composite-9", "COMPLETED").await;
    mount_extractions(&server, "composite-9").await;
    let service = service(&server, store_with_user_token());

    let result = service
        .upload_and_analyze(&page("r1", b"receipt"))
        .await
        .expect("analysis should complete");

    assert!(result.extraction("iban").is_some());
}
