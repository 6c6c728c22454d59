use crate::{CompositeDocumentInfo, PageId, PartialDocument, PartialDocumentInfo};

use serde_json::json;

/// **VALUE**: Verifies that partial documents sort by order index, not by page id.
///
/// **WHY THIS MATTERS**: The composite document must follow the order established by the
/// user, which is unrelated to page ids.
///
/// **BUG THIS CATCHES**: Would catch an Ord impl comparing page ids first.
#[test]
fn given_partial_documents_when_sorted_then_follow_order_index() {
    let mut docs = vec![
        PartialDocument::new(PageId::from("a"), 2),
        PartialDocument::new(PageId::from("z"), 0),
        PartialDocument::new(PageId::from("m"), 1),
    ];

    docs.sort();

    let ids: Vec<&str> = docs.iter().map(|d| d.page_id.as_str()).collect();
    assert_eq!(ids, vec!["z", "m", "a"]);
}

/// **VALUE**: Verifies that equality is defined by the referenced page only.
///
/// **BUG THIS CATCHES**: Would catch a derived PartialEq comparing the order index.
#[test]
fn given_same_page_with_different_order_when_compared_then_equal() {
    let first = PartialDocument::new(PageId::from("p1"), 0);
    let second = PartialDocument::new(PageId::from("p1"), 5);

    assert_eq!(first, second);
}

/// **VALUE**: Verifies rotation normalisation and the composite wire shape.
///
/// **WHY THIS MATTERS**: The service expects `rotationDelta` within 0..360 and the field
/// names `partialDocuments` / `document`.
///
/// **BUG THIS CATCHES**: Would catch `%` (which keeps negative values) instead of `rem_euclid`.
#[test]
fn given_negative_rotation_when_serialized_then_normalized_and_camel_cased() {
    let mut info = PartialDocumentInfo::pending();
    info.document_url = Some("https://api.example.com/documents/1".to_string());
    info.set_rotation(-90);

    let composite = CompositeDocumentInfo {
        partial_documents: vec![info],
    };

    assert_eq!(
        serde_json::to_value(&composite).unwrap(),
        json!({
            "partialDocuments": [
                { "document": "https://api.example.com/documents/1", "rotationDelta": 270 }
            ]
        })
    );
}
