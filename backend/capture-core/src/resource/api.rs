//! Primary API resources (documents, extractions, feedback).

use crate::error::ApiError;
use crate::resource::{
    AuthKind, Created, Empty, Extractions, Json, RawBytes, Resource, ResourceDescriptor,
    ServiceDomain, ServiceEndpoint, UserAuth,
};

use models::{CompositeDocumentInfo, Document, Feedback, PageContentType};

use reqwest::Method;
use serde_json::Value;

pub const API_V2_JSON: &str = "application/vnd.gini.v2+json";
pub const COMPOSITE_JSON: &str = "application/vnd.gini.v2.composite+json";
pub const UPLOAD_METADATA_HEADER: &str = "Upload-Metadata";

const DOCUMENTS_PATH: &str = "/documents";
const PARTIAL_PATH: &str = "/documents/partial";
const COMPOSITE_PATH: &str = "/documents/composite";

const USER_BEARER: AuthKind = AuthKind::User(UserAuth::Bearer);

fn api_descriptor(
    endpoint: &ServiceEndpoint,
    method: Method,
    path: impl Into<String>,
) -> ResourceDescriptor {
    ResourceDescriptor::new(ServiceDomain::Api, endpoint, method, path, USER_BEARER)
        .with_header("Accept", API_V2_JSON)
}

fn link_descriptor(method: Method, url: &str) -> ResourceDescriptor {
    ResourceDescriptor::for_url(ServiceDomain::Api, method, url, USER_BEARER)
        .with_header("Accept", API_V2_JSON)
}

/// Upload one page. The body is attached by the transport's upload flavor.
pub fn upload_partial(
    endpoint: &ServiceEndpoint,
    content_type: PageContentType,
    metadata: Option<&str>,
) -> (Resource<Created>, &'static str) {
    let mut descriptor = api_descriptor(endpoint, Method::POST, PARTIAL_PATH);
    if let Some(metadata) = metadata {
        descriptor = descriptor.with_header(UPLOAD_METADATA_HEADER, metadata);
    }
    (Resource::new(descriptor), content_type.partial_media_type())
}

pub fn create_composite(
    endpoint: &ServiceEndpoint,
    info: &CompositeDocumentInfo,
) -> Result<Resource<Created>, ApiError> {
    let body = serde_json::to_vec(info)
        .map_err(|e| ApiError::unknown(format!("Cannot encode composite document: {e}")))?;

    Ok(Resource::new(
        api_descriptor(endpoint, Method::POST, COMPOSITE_PATH).with_body(body, COMPOSITE_JSON),
    ))
}

pub fn document(endpoint: &ServiceEndpoint, id: &str) -> Resource<Json<Document>> {
    Resource::new(api_descriptor(endpoint, Method::GET, format!("{DOCUMENTS_PATH}/{id}")))
}

pub fn document_at(url: &str) -> Resource<Json<Document>> {
    Resource::new(link_descriptor(Method::GET, url))
}

pub fn delete_document(endpoint: &ServiceEndpoint, id: &str) -> Resource<Empty> {
    Resource::new(api_descriptor(endpoint, Method::DELETE, format!("{DOCUMENTS_PATH}/{id}")))
}

pub fn delete_document_at(url: &str) -> Resource<Empty> {
    Resource::new(link_descriptor(Method::DELETE, url))
}

pub fn extractions(endpoint: &ServiceEndpoint, document: &Document) -> Resource<Extractions> {
    let descriptor = match &document.links.extractions {
        Some(url) => link_descriptor(Method::GET, url),
        None => api_descriptor(
            endpoint,
            Method::GET,
            format!("{DOCUMENTS_PATH}/{}/extractions", document.id),
        ),
    };
    Resource::new(descriptor)
}

pub fn feedback(
    endpoint: &ServiceEndpoint,
    document_id: &str,
    feedback: &Feedback,
) -> Result<Resource<Empty>, ApiError> {
    let body = serde_json::to_vec(feedback)
        .map_err(|e| ApiError::unknown(format!("Cannot encode feedback: {e}")))?;

    Ok(Resource::new(
        api_descriptor(
            endpoint,
            Method::PUT,
            format!("{DOCUMENTS_PATH}/{document_id}/extractions/feedback"),
        )
        .with_body(body, API_V2_JSON),
    ))
}

pub fn layout(endpoint: &ServiceEndpoint, document: &Document) -> Resource<Json<Value>> {
    sub_resource(endpoint, document, document.links.layout.as_deref(), "layout")
}

pub fn pages(endpoint: &ServiceEndpoint, document: &Document) -> Resource<Json<Value>> {
    sub_resource(endpoint, document, document.links.pages.as_deref(), "pages")
}

pub fn processed(endpoint: &ServiceEndpoint, document: &Document) -> Resource<RawBytes> {
    let descriptor = match &document.links.processed {
        Some(url) => ResourceDescriptor::for_url(ServiceDomain::Api, Method::GET, url, USER_BEARER),
        None => ResourceDescriptor::new(
            ServiceDomain::Api,
            endpoint,
            Method::GET,
            format!("{DOCUMENTS_PATH}/{}/processed", document.id),
            USER_BEARER,
        ),
    };
    Resource::new(descriptor.with_header("Accept", "application/octet-stream"))
}

fn sub_resource<C: crate::resource::ResponseContract>(
    endpoint: &ServiceEndpoint,
    document: &Document,
    link: Option<&str>,
    name: &str,
) -> Resource<C> {
    let descriptor = match link {
        Some(url) => link_descriptor(Method::GET, url),
        None => api_descriptor(
            endpoint,
            Method::GET,
            format!("{DOCUMENTS_PATH}/{}/{name}", document.id),
        ),
    };
    Resource::new(descriptor)
}
