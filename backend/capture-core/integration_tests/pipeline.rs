use super::helpers::{
    document_url, mount_partial, page, service, service_with_uploaded_pages,
    store_with_user_token,
};

use capture_core::error::ApiErrorKind;

use models::PageId;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Composition pipeline tests
// ============================================================================

/// **VALUE**: Verifies composite order follows upload start order, not completion order.
///
/// **WHY THIS MATTERS**: Page 1 of an invoice can be larger and finish last; the composite
/// must still list it first.
///
/// **BUG THIS CATCHES**: Would catch order being assigned when an upload completes.
#[tokio::test]
async fn given_slow_first_upload_when_both_complete_then_order_follows_start_order() {
    // GIVEN: p1 answers after p2
    let server = MockServer::start().await;
    mount_partial(&server, b"page-one", "partial-1", Duration::from_millis(300)).await;
    mount_partial(&server, b"page-two", "partial-2", Duration::ZERO).await;
    let service = service(&server, store_with_user_token());

    // WHEN: Uploading both concurrently
    let p1 = page("p1", b"page-one");
    let p2 = page("p2", b"page-two");
    let (first, second) = tokio::join!(service.upload(&p1, None), service.upload(&p2, None));
    first.expect("p1 upload");
    second.expect("p2 upload");

    // THEN: p1 precedes p2
    let info = service.pipeline().build_composite_info();
    let urls: Vec<Option<String>> =
        info.partial_documents.iter().map(|p| p.document_url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            Some(document_url(&server, "partial-1")),
            Some(document_url(&server, "partial-2")),
        ]
    );
}

/// **VALUE**: Verifies a failed upload leaves no trace in the pipeline.
///
/// **WHY THIS MATTERS**: A ghost entry would end up in the composite as a page without URL.
///
/// **BUG THIS CATCHES**: Would catch the reservation surviving an error.
#[tokio::test]
async fn given_upload_fails_when_upload_then_error_returned_and_no_entry() {
    // GIVEN: Partial creation fails
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents/partial"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let service = service(&server, store_with_user_token());

    // WHEN: Uploading
    let error = service
        .upload(&page("p1", b"page-one"), None)
        .await
        .expect_err("upload must fail");

    // THEN: The error is surfaced and the pipeline is empty
    assert_eq!(error.as_api().map(|e| e.kind()), Some(ApiErrorKind::Unknown));
    assert!(service.pipeline().partial_documents().is_empty());
    assert_eq!(service.pipeline().pending_uploads(), 0);
}

/// **VALUE**: Verifies reorder mirrors the caller's sequence.
///
/// **WHY THIS MATTERS**: Users drag pages around on the review screen; the composite must match.
///
/// **BUG THIS CATCHES**: Would catch unlisted pages being dropped or unknown ids being added.
#[tokio::test]
async fn given_three_pages_when_reordered_then_composite_matches_sequence() {
    // GIVEN: Three uploaded pages
    let server = MockServer::start().await;
    mount_partial(&server, b"page-three", "partial-3", Duration::ZERO).await;
    let service = service_with_uploaded_pages(&server).await;
    service
        .upload(&page("p3", b"page-three"), None)
        .await
        .expect("p3 upload");

    // WHEN: Listing p3 then p1 (p2 unlisted) plus an unknown id
    service.reorder(&[PageId::from("p3"), PageId::from("ghost"), PageId::from("p1")]);

    // THEN: p3, p1, then p2
    let order: Vec<String> = service
        .pipeline()
        .partial_documents()
        .iter()
        .map(|entry| entry.page_id.to_string())
        .collect();
    assert_eq!(order, vec!["p3", "p1", "p2"]);
}

/// **VALUE**: Verifies rotation is recorded locally without a re-upload.
///
/// **WHY THIS MATTERS**: Rotation is applied by the composite call; uploading again wastes
/// bandwidth on mobile connections.
///
/// **BUG THIS CATCHES**: Would catch rotation triggering a second partial upload.
#[tokio::test]
async fn given_uploaded_page_when_rotated_then_delta_recorded_without_reupload() {
    // GIVEN: One uploaded page, uploads counted
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents/partial"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", document_url(&server, "partial-1").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    super::helpers::mount_document(&server, "partial-1", "COMPLETED").await;
    let service = service(&server, store_with_user_token());
    service.upload(&page("p1", b"page-one"), None).await.expect("upload");

    // WHEN: Rotating by 450 degrees, and rotating an unknown page
    let known = service.update(&PageId::from("p1"), 450);
    let unknown = service.update(&PageId::from("ghost"), 90);

    // THEN: Normalized delta, unknown page reported
    assert!(known);
    assert!(!unknown);
    let info = service.pipeline().build_composite_info();
    assert_eq!(info.partial_documents[0].rotation_delta, 90);
}

/// **VALUE**: Verifies removal drops the entry and deletes the remote partial.
///
/// **WHY THIS MATTERS**: Deleted pages must neither be analysed nor kept on the server.
///
/// **BUG THIS CATCHES**: Would catch a missing DELETE or a stale composite entry.
#[tokio::test]
async fn given_uploaded_pages_when_one_removed_then_deleted_remotely_and_locally() {
    // GIVEN: Two pages, DELETE of the first expected once
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/partial-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_with_uploaded_pages(&server).await;

    // WHEN: Removing p1
    let removed = service.remove(&PageId::from("p1")).await;

    // THEN: Entry returned, composite holds only p2
    assert_eq!(removed.map(|entry| entry.page_id), Some(PageId::from("p1")));
    let info = service.pipeline().build_composite_info();
    assert_eq!(info.len(), 1);
    assert_eq!(
        info.partial_documents[0].document_url,
        Some(document_url(&server, "partial-2"))
    );
}

/// **VALUE**: Verifies a failing remote delete does not keep the page locally.
///
/// **WHY THIS MATTERS**: Remote cleanup is best-effort; the user's removal always wins.
///
/// **BUG THIS CATCHES**: Would catch delete errors aborting the local removal.
#[tokio::test]
async fn given_delete_fails_when_page_removed_then_still_removed_locally() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/partial-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let service = service_with_uploaded_pages(&server).await;

    let removed = service.remove(&PageId::from("p1")).await;

    assert!(removed.is_some());
    assert_eq!(service.pipeline().partial_documents().len(), 1);
    assert!(service.remove(&PageId::from("p1")).await.is_none());
}

/// **VALUE**: Verifies an in-flight upload is excluded from the composite until it completes.
///
/// **WHY THIS MATTERS**: A composite referencing a page without URL is rejected by the server.
///
/// **BUG THIS CATCHES**: Would catch pending entries leaking into the composite body.
#[tokio::test]
async fn given_upload_in_flight_when_building_composite_then_pending_page_excluded() {
    // GIVEN: p2 uploaded, p1 slow
    let server = MockServer::start().await;
    mount_partial(&server, b"page-two", "partial-2", Duration::ZERO).await;
    mount_partial(&server, b"page-one", "partial-1", Duration::from_millis(500)).await;
    let service = service(&server, store_with_user_token());
    service.upload(&page("p2", b"page-two"), None).await.expect("p2 upload");

    let uploader = service.clone();
    let slow = tokio::spawn(async move { uploader.upload(&page("p1", b"page-one"), None).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // WHEN: Building while p1 is in flight
    let during = service.pipeline().build_composite_info();

    // THEN: Only p2; after completion both, in start order
    assert_eq!(service.pipeline().pending_uploads(), 1);
    assert_eq!(during.len(), 1);

    slow.await.expect("task").expect("p1 upload");
    service.pipeline().wait_for_uploads().await;
    let after = service.pipeline().build_composite_info();
    let urls: Vec<Option<String>> =
        after.partial_documents.iter().map(|p| p.document_url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            Some(document_url(&server, "partial-2")),
            Some(document_url(&server, "partial-1")),
        ]
    );
}
