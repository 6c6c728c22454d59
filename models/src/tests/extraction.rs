use crate::{Extraction, ExtractionResult, Feedback};

use serde_json::json;

fn sample_payload() -> Vec<u8> {
    json!({
        "extractions": {
            "iban": {
                "entity": "iban",
                "value": "DE89370400440532013000",
                "box": { "page": 1, "left": 10.0, "top": 20.0, "width": 200.0, "height": 12.5 },
                "candidates": "ibans"
            },
            "amountToPay": { "entity": "amount", "value": "950.00:EUR" }
        },
        "lineItems": [
            {
                "description": { "entity": "text", "value": "Desk chair" },
                "grossPrice": { "entity": "amount", "value": "950.00:EUR" }
            }
        ],
        "candidates": {
            "ibans": [
                { "entity": "iban", "value": "DE89370400440532013000" },
                { "entity": "iban", "value": "DE02120300000000202051" }
            ]
        }
    })
    .to_string()
    .into_bytes()
}

/// **VALUE**: Verifies that a payload with `extractions` and `lineItems` is retrievable by name.
///
/// **WHY THIS MATTERS**: The review screen looks up fields like `iban` by name. A lossy parse
/// (dropped box, renamed field, wrong value) shows the user something the service never said.
///
/// **BUG THIS CATCHES**: Would catch if the map key is not copied into `Extraction::name`, or
/// if top-level `lineItems` is ignored.
#[test]
fn given_extraction_payload_when_parsed_then_lookup_by_name_returns_source_values() {
    // GIVEN: A service payload
    let payload = sample_payload();

    // WHEN: Parsing
    let result = ExtractionResult::from_json(&payload).expect("payload should parse");

    // THEN: Flat lookup returns the exact source values
    let iban = result.extraction("iban").expect("iban should exist");
    assert_eq!(iban.name, "iban");
    assert_eq!(iban.value, "DE89370400440532013000");
    assert_eq!(iban.candidates.as_deref(), Some("ibans"));
    assert_eq!(iban.bounding_box.map(|b| b.page), Some(1));

    assert_eq!(result.extraction("amountToPay").map(|e| e.value.as_str()), Some("950.00:EUR"));

    // AND: Line items are kept in order with named fields
    let items = result.line_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"].value, "Desk chair");
    assert_eq!(items[0]["grossPrice"].name, "grossPrice");

    // AND: Candidate pools are preserved
    assert_eq!(result.candidates("ibans").len(), 2);
}

/// **VALUE**: Verifies that `compoundExtractions.lineItems` wins over a top-level `lineItems`.
///
/// **WHY THIS MATTERS**: Newer responses nest line items under `compoundExtractions`; the
/// top-level form is only a fallback and must not overwrite the nested one.
///
/// **BUG THIS CATCHES**: Would catch an `insert` where `or_insert` is intended.
#[test]
fn given_both_line_item_forms_when_parsed_then_compound_form_is_kept() {
    let payload = json!({
        "extractions": {},
        "compoundExtractions": {
            "lineItems": [ { "description": { "entity": "text", "value": "nested" } } ]
        },
        "lineItems": [ { "description": { "entity": "text", "value": "top-level" } } ]
    })
    .to_string();

    let result = ExtractionResult::from_json(payload.as_bytes()).unwrap();

    assert_eq!(result.line_items()[0]["description"].value, "nested");
}

/// **VALUE**: Verifies that malformed payloads are rejected rather than half-parsed.
///
/// **BUG THIS CATCHES**: Would catch `#[serde(default)]` on `value`, which would turn a
/// broken response into empty extractions.
#[test]
fn given_extraction_without_value_when_parsed_then_returns_error() {
    let payload = br#"{"extractions": {"iban": {"entity": "iban"}}}"#;

    assert!(ExtractionResult::from_json(payload).is_err());
}

/// **VALUE**: Verifies the feedback wire shape.
///
/// **WHY THIS MATTERS**: The service schema is fixed; the field name must not leak into the
/// body and `box` must be omitted when absent.
///
/// **BUG THIS CATCHES**: Would catch removal of `#[serde(skip)]` on `name`.
#[test]
fn given_corrected_feedback_when_serialized_then_matches_service_schema() {
    // GIVEN: Feedback derived from a result with one corrected value
    let result = ExtractionResult::new(
        vec![Extraction::new("amountToPay", "amount", "950.00:EUR")],
        Default::default(),
        Default::default(),
    );
    let mut feedback = Feedback::from_result(&result);
    assert!(feedback.correct("amountToPay", "951.00:EUR"));
    assert!(!feedback.correct("unknownField", "x"));

    // WHEN: Serializing
    let body = serde_json::to_value(&feedback).unwrap();

    // THEN: Only entity/value per extraction, no compound section
    assert_eq!(
        body,
        json!({ "extractions": { "amountToPay": { "entity": "amount", "value": "951.00:EUR" } } })
    );
}
