use crate::{ModelError, PageBuilder, PageContentType};

/// **VALUE**: Verifies that a fully specified page builds.
///
/// **BUG THIS CATCHES**: Would catch a validation rule that rejects legitimate pages.
#[test]
fn given_complete_builder_when_building_page_then_succeeds() {
    let page = PageBuilder::default()
        .with_id("p1")
        .with_bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .with_content_type(PageContentType::Png)
        .with_upload_metadata("Platform=linux")
        .build()
        .expect("page should build");

    assert_eq!(page.id.as_str(), "p1");
    assert_eq!(page.bytes.len(), 4);
    assert_eq!(
        page.content_type.partial_media_type(),
        "application/vnd.gini.v2.partial+png"
    );
}

/// **VALUE**: Verifies that empty page content is rejected before any upload.
///
/// **WHY THIS MATTERS**: An empty upload costs a network round-trip and produces a partial
/// document the service cannot analyse.
///
/// **BUG THIS CATCHES**: Would catch removal of the empty-bytes check.
#[test]
fn given_empty_bytes_when_building_page_then_returns_validation_error() {
    let result = PageBuilder::default()
        .with_id("p1")
        .with_bytes(Vec::new())
        .with_content_type(PageContentType::Jpeg)
        .build();

    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Page 'p1' has no content");
        }
        Ok(_) => panic!("Expected validation error"),
    }
}

/// **VALUE**: Verifies that a missing page id is reported by name.
///
/// **BUG THIS CATCHES**: Would catch a builder defaulting the id to an empty string.
#[test]
fn given_missing_id_when_building_page_then_returns_validation_error() {
    let result = PageBuilder::default()
        .with_bytes(vec![1, 2, 3])
        .with_content_type(PageContentType::Pdf)
        .build();

    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Page id is required");
        }
        Ok(_) => panic!("Expected validation error"),
    }
}

/// **VALUE**: Verifies that header-breaking metadata is refused.
///
/// **WHY THIS MATTERS**: Upload metadata becomes an HTTP header value; a newline would make
/// the request unsendable.
///
/// **BUG THIS CATCHES**: Would catch removal of the control-character check.
#[test]
fn given_metadata_with_newline_when_building_page_then_returns_validation_error() {
    let result = PageBuilder::default()
        .with_id("p1")
        .with_bytes(vec![1])
        .with_content_type(PageContentType::Png)
        .with_upload_metadata("a\nb")
        .build();

    assert!(result.is_err());
}
