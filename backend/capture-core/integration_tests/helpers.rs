//! Test helpers for the integration tests.
//!
//! Every test runs against its own `wiremock` server that plays both the
//! primary API and the user center.

use capture_core::DocumentService;
use capture_core::config::SdkConfig;
use capture_core::credentials::{Credentials, InMemoryCredentialStore, UserCredentials};
use capture_core::transport::Transport;

use models::{AccessToken, Page, PageBuilder, PageContentType};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::{Value, json};
use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const CLIENT_DOMAIN: &str = "example.com";
pub const USER_EMAIL: &str = "stored-user@example.com";
pub const USER_TOKEN: &str = "user-token-1";
pub const FRESH_USER_TOKEN: &str = "user-token-2";
pub const CLIENT_TOKEN: &str = "client-token-1";

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Config pointing both services at `server`, with short poll and retry delays.
pub fn test_config(server: &MockServer) -> SdkConfig {
    let mut config = SdkConfig::default();
    config.api.base_url = server.uri();
    config.api.user_center_url = server.uri();
    config.client.id = Some(CLIENT_ID.to_string());
    config.client.secret = Some(CLIENT_SECRET.into());
    config.client.domain = Some(CLIENT_DOMAIN.to_string());
    config.analysis.poll_interval = Duration::from_millis(10);
    config.analysis.feedback_retry_delay = Duration::from_millis(10);
    config
}

pub fn valid_token(value: &str) -> AccessToken {
    AccessToken::new(value, SystemTime::now() + Duration::from_secs(3600))
}

/// Store holding a valid user access token and no login.
pub fn store_with_user_token() -> Arc<InMemoryCredentialStore> {
    let store = Arc::new(InMemoryCredentialStore::new());
    Credentials::new(store.clone())
        .save_user_token(&valid_token(USER_TOKEN))
        .expect("user token should be stored");
    store
}

/// Store holding a user login plus a valid user access token.
pub fn store_with_user_login() -> Arc<InMemoryCredentialStore> {
    let store = store_with_user_token();
    Credentials::new(store.clone())
        .save_user_credentials(&UserCredentials {
            email: USER_EMAIL.to_string(),
            password: "stored-password".into(),
        })
        .expect("user login should be stored");
    store
}

pub fn transport(server: &MockServer, store: Arc<InMemoryCredentialStore>) -> Arc<Transport> {
    Arc::new(Transport::new(&test_config(server), store).expect("transport should build"))
}

pub fn service(server: &MockServer, store: Arc<InMemoryCredentialStore>) -> Arc<DocumentService> {
    let config = test_config(server);
    Arc::new(DocumentService::from_config(&config, store).expect("service should build"))
}

pub fn page(id: &str, bytes: &[u8]) -> Page {
    PageBuilder::default()
        .with_id(id)
        .with_bytes(bytes)
        .with_content_type(PageContentType::Jpeg)
        .build()
        .expect("page should build")
}

pub fn document_url(server: &MockServer, id: &str) -> String {
    format!("{}/documents/{id}", server.uri())
}

pub fn document_json(server: &MockServer, id: &str, progress: &str) -> Value {
    let url = document_url(server, id);
    json!({
        "id": id,
        "creationDate": 1_700_000_000_000_u64,
        "name": format!("{id}.jpg"),
        "progress": progress,
        "origin": "UPLOAD",
        "sourceClassification": "SCANNED",
        "pageCount": 1,
        "_links": {
            "document": url,
            "extractions": format!("{url}/extractions"),
            "layout": format!("{url}/layout"),
            "processed": format!("{url}/processed"),
            "pages": format!("{url}/pages")
        }
    })
}

pub fn token_json(token: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "scope": "read write"
    })
}

pub fn extractions_json() -> Value {
    json!({
        "extractions": {
            "amountToPay": { "entity": "amount", "value": "950.00:EUR" },
            "iban": { "entity": "iban", "value": "DE89370400440532013000" },
            "paymentRecipient": { "entity": "companyname", "value": "Möbelhaus Nord GmbH" }
        },
        "compoundExtractions": {
            "lineItems": [
                {
                    "description": { "entity": "text", "value": "Desk chair" },
                    "grossPrice": { "entity": "amount", "value": "950.00:EUR" }
                }
            ]
        }
    })
}

/// `POST /documents/partial` for `bytes` → 201 with the partial's location, then
/// `GET` of that location → the partial document.
pub async fn mount_partial(server: &MockServer, bytes: &[u8], id: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/documents/partial"))
        .and(body_bytes(bytes.to_vec()))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", document_url(server, id).as_str())
                .set_delay(delay),
        )
        .mount(server)
        .await;

    mount_document(server, id, "COMPLETED").await;
}

pub async fn mount_document(server: &MockServer, id: &str, progress: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/documents/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(server, id, progress)))
        .mount(server)
        .await;
}

/// `POST /documents/composite` → 201 with the composite's location.
pub async fn mount_composite(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/documents/composite"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Location", document_url(server, id).as_str()),
        )
        .mount(server)
        .await;
}

pub async fn mount_extractions(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/documents/{id}/extractions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(extractions_json()))
        .mount(server)
        .await;
}

/// Service with two uploaded pages (`p1`, `p2`), ready for analysis.
pub async fn service_with_uploaded_pages(server: &MockServer) -> Arc<DocumentService> {
    mount_partial(server, b"page-one", "partial-1", Duration::ZERO).await;
    mount_partial(server, b"page-two", "partial-2", Duration::ZERO).await;

    let service = service(server, store_with_user_token());
    service
        .upload(&page("p1", b"page-one"), None)
        .await
        .expect("p1 upload should succeed");
    service
        .upload(&page("p2", b"page-two"), None)
        .await
        .expect("p2 upload should succeed");
    service
}
