use crate::error::ApiErrorKind;
use crate::resource::{
    AuthKind, Created, ResourceDescriptor, ResponseContract, ServiceDomain, ServiceEndpoint,
    UserAuth, api,
};
use crate::transport::response::HttpResponse;

use models::{Document, DocumentLinks, DocumentProgress};

use reqwest::Method;

fn endpoint() -> ServiceEndpoint {
    ServiceEndpoint::from_base_url("https://api.example.com/")
}

fn document(extractions_link: Option<&str>) -> Document {
    Document {
        id: "doc-1".to_string(),
        creation_date: 0,
        name: None,
        progress: DocumentProgress::Completed,
        origin: None,
        source_classification: None,
        page_count: Some(1),
        links: DocumentLinks {
            document: "https://api.example.com/documents/doc-1".to_string(),
            extractions: extractions_link.map(str::to_string),
            layout: None,
            processed: None,
            pages: None,
        },
    }
}

/// **VALUE**: Verifies descriptor equality is defined by the resolved URL only.
///
/// **WHY THIS MATTERS**: Two requests for the same remote resource must compare equal even when
/// they carry different bodies or headers, otherwise lookups keyed by resource miss.
///
/// **BUG THIS CATCHES**: Would catch a derived `PartialEq` creeping back in and comparing bodies.
#[test]
fn given_same_url_with_different_body_and_headers_when_compared_then_equal() {
    // GIVEN: Two descriptors for the same URL
    let first = ResourceDescriptor::new(
        ServiceDomain::Api,
        &endpoint(),
        Method::PUT,
        "/documents/doc-1",
        AuthKind::None,
    )
    .with_body(b"one".to_vec(), "text/plain");
    let second = ResourceDescriptor::new(
        ServiceDomain::Api,
        &endpoint(),
        Method::PUT,
        "documents/doc-1",
        AuthKind::User(UserAuth::Bearer),
    )
    .with_header("Accept", "application/json")
    .with_body(b"two".to_vec(), "application/json");

    // WHEN/THEN: They are equal
    assert_eq!(first, second);

    // AND: A different query makes them differ
    let third = first.clone().with_query("page", "2");
    assert_ne!(first, third);
}

/// **VALUE**: Verifies an absolute server link is split back into a resolvable descriptor.
///
/// **WHY THIS MATTERS**: Document links and `Location` headers are absolute URLs; losing the
/// query or port while splitting them sends requests to the wrong place.
///
/// **BUG THIS CATCHES**: Would catch a split that drops the port or the query string.
#[test]
fn given_absolute_link_when_for_url_then_url_round_trips() {
    // GIVEN: A link with port and query
    let link = "http://127.0.0.1:8080/documents/doc-1/extractions?incubator=true";

    // WHEN: Building a descriptor from it
    let descriptor =
        ResourceDescriptor::for_url(ServiceDomain::Api, Method::GET, link, AuthKind::None);

    // THEN: The resolved URL is the link
    let url = descriptor.url().expect("link should resolve");
    assert_eq!(url.as_str(), link);
    assert_eq!(descriptor.path(), "/documents/doc-1/extractions");
}

/// **VALUE**: Verifies a malformed URL is reported as `unknown` instead of panicking.
///
/// **WHY THIS MATTERS**: A bad base URL in configuration must surface as a typed transport error
/// without sending anything.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap()` on URL parsing slipping back in.
#[test]
fn given_base_url_without_scheme_when_url_resolved_then_unknown_error() {
    // GIVEN: A descriptor built from an unusable base URL
    let descriptor = ResourceDescriptor::new(
        ServiceDomain::Api,
        &ServiceEndpoint::from_base_url("not a url"),
        Method::GET,
        "/documents",
        AuthKind::None,
    );

    // WHEN: Resolving
    let error = descriptor.url().expect_err("URL without scheme must fail");

    // THEN: Reported as unknown
    assert_eq!(error.kind(), ApiErrorKind::Unknown);
}

/// **VALUE**: Verifies only user-authorized primary API calls take part in the 401 refresh.
///
/// **WHY THIS MATTERS**: Refreshing on a user center 401 would recurse into the login that just
/// failed.
///
/// **BUG THIS CATCHES**: Would catch the refresh predicate ignoring the service domain.
#[test]
fn given_auth_and_domain_combinations_when_checked_then_only_api_user_calls_refresh() {
    let make = |domain, auth| {
        ResourceDescriptor::new(domain, &endpoint(), Method::GET, "/x", auth)
            .refreshes_on_unauthorized()
    };

    assert!(make(ServiceDomain::Api, AuthKind::User(UserAuth::Bearer)));
    assert!(make(ServiceDomain::Api, AuthKind::User(UserAuth::Basic)));
    assert!(!make(ServiceDomain::Api, AuthKind::Client));
    assert!(!make(ServiceDomain::Api, AuthKind::None));
    assert!(!make(ServiceDomain::UserCenter, AuthKind::User(UserAuth::Basic)));
    assert!(!make(ServiceDomain::UserCenter, AuthKind::Client));
}

/// **VALUE**: Verifies the extractions resource follows the document's link when present.
///
/// **WHY THIS MATTERS**: The server owns its URL layout; the link is authoritative.
///
/// **BUG THIS CATCHES**: Would catch the catalogue always building `/documents/{id}/extractions`.
#[test]
fn given_document_with_and_without_link_when_extractions_resource_then_path_matches() {
    // GIVEN: One document with a link, one without
    let linked = document(Some("https://other.example.com/v2/doc-1/extractions"));
    let unlinked = document(None);

    // WHEN: Building the resources
    let from_link = api::extractions(&endpoint(), &linked);
    let from_id = api::extractions(&endpoint(), &unlinked);

    // THEN: The link wins; otherwise the id-based path is used
    assert_eq!(
        from_link.descriptor().url().expect("url").as_str(),
        "https://other.example.com/v2/doc-1/extractions"
    );
    assert_eq!(
        from_id.descriptor().url().expect("url").as_str(),
        "https://api.example.com/documents/doc-1/extractions"
    );
}

/// **VALUE**: Verifies the feedback resource is a PUT carrying the vendor JSON body.
///
/// **WHY THIS MATTERS**: The server rejects feedback sent with another verb or media type.
///
/// **BUG THIS CATCHES**: Would catch a POST or a missing `compoundExtractions` omission rule.
#[test]
fn given_feedback_when_resource_built_then_put_with_json_body() {
    // GIVEN: Feedback with one field
    let feedback = models::Feedback::new([models::Extraction::new(
        "amountToPay",
        "amount",
        "1.00:EUR",
    )]);

    // WHEN: Building the resource
    let resource = api::feedback(&endpoint(), "doc-1", &feedback).expect("feedback should encode");
    let descriptor = resource.descriptor();

    // THEN: PUT to the feedback path with a JSON body
    assert_eq!(descriptor.method(), &Method::PUT);
    assert_eq!(descriptor.path(), "/documents/doc-1/extractions/feedback");
    let body: serde_json::Value =
        serde_json::from_slice(descriptor.body().expect("body")).expect("json");
    assert_eq!(body["extractions"]["amountToPay"]["value"], "1.00:EUR");
    assert!(body.get("compoundExtractions").is_none());
}

/// **VALUE**: Verifies the "created" contract yields the `Location` header and rejects its absence.
///
/// **WHY THIS MATTERS**: Uploads are only usable through the location the server hands back.
///
/// **BUG THIS CATCHES**: Would catch a case-sensitive header lookup or an empty location
/// treated as success.
#[test]
fn given_created_response_when_decoded_then_location_or_error() {
    // GIVEN: A 201 with a lowercase location header
    let mut response = HttpResponse::new(201_u16, Vec::new());
    response
        .headers
        .push(("location".to_string(), "https://api.example.com/documents/p1".to_string()));

    // WHEN/THEN: The location is returned
    assert_eq!(
        Created::decode(&response).expect("location"),
        "https://api.example.com/documents/p1"
    );

    // AND: Without the header decoding fails
    assert!(Created::decode(&HttpResponse::new(201_u16, Vec::new())).is_err());
}
