//! Resource descriptors: immutable values describing one remote call.
//!
//! A descriptor holds the scheme/host/path/query, method, headers, body and
//! the kind of authorization the call needs. It never holds a credential
//! value; the transport injects those at dispatch time.
//!
//! Construction never fails. Resolution to a [`Url`] can fail for malformed
//! components, which the transport reports instead of sending the request.

pub mod api;
pub mod contract;
pub mod user_center;

pub use contract::{Created, Empty, Extractions, Json, RawBytes, ResponseContract};

use crate::error::ApiError;

use std::marker::PhantomData;

use reqwest::Method;
use url::Url;

/// Which service a call targets.
///
/// Only calls against the primary API take part in the 401 refresh policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceDomain {
    Api,
    UserCenter,
}

/// Variant of a user-level credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAuth {
    /// `Basic base64(client_id:client_secret)`.
    Basic,
    /// Stored user access token.
    Bearer,
}

/// Authorization a call requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    None,
    /// Client access token from the client credentials grant.
    Client,
    User(UserAuth),
}

/// Scheme plus authority (and optional base path) of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    scheme: String,
    host: String,
}

impl ServiceEndpoint {
    /// Split a base URL such as `https://api.example.com` into its parts.
    ///
    /// Never fails; an unusable value surfaces when a descriptor is resolved.
    pub fn from_base_url(base_url: &str) -> Self {
        match base_url.split_once("://") {
            Some((scheme, rest)) => Self {
                scheme: scheme.to_string(),
                host: rest.trim_end_matches('/').to_string(),
            },
            None => Self {
                scheme: String::new(),
                host: base_url.trim_end_matches('/').to_string(),
            },
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    scheme: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    auth: AuthKind,
    domain: ServiceDomain,
}

impl ResourceDescriptor {
    pub fn new(
        domain: ServiceDomain,
        endpoint: &ServiceEndpoint,
        method: Method,
        path: impl Into<String>,
        auth: AuthKind,
    ) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Self {
            scheme: endpoint.scheme.clone(),
            host: endpoint.host.clone(),
            path,
            query: Vec::new(),
            method,
            headers: Vec::new(),
            body: None,
            auth,
            domain,
        }
    }

    /// Descriptor for an absolute URL handed out by the server (document links,
    /// `Location` headers).
    pub fn for_url(domain: ServiceDomain, method: Method, url: &str, auth: AuthKind) -> Self {
        let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
        let (authority, path_and_query) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, "/"),
        };
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));

        let endpoint = ServiceEndpoint {
            scheme: scheme.to_string(),
            host: authority.to_string(),
        };
        let mut descriptor = Self::new(domain, &endpoint, method, path, auth);
        descriptor.query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        descriptor
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        self.headers
            .push(("Content-Type".to_string(), content_type.into()));
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn auth(&self) -> AuthKind {
        self.auth
    }

    pub fn domain(&self) -> ServiceDomain {
        self.domain
    }

    /// Whether a 401 on this call triggers one re-login and replay.
    pub fn refreshes_on_unauthorized(&self) -> bool {
        self.domain == ServiceDomain::Api && matches!(self.auth, AuthKind::User(_))
    }

    /// Resolve to an absolute URL.
    #[track_caller]
    pub fn url(&self) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}://{}{}", self.scheme, self.host, self.path))?;

        if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
            return Err(ApiError::unknown(format!(
                "Malformed URL: {}://{}{}",
                self.scheme, self.host, self.path
            )));
        }

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    fn canonical(&self) -> String {
        match self.url() {
            Ok(url) => url.to_string(),
            Err(_) => {
                let query: Vec<String> = self
                    .query
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                format!("{}://{}{}?{}", self.scheme, self.host, self.path, query.join("&"))
            }
        }
    }
}

/// Equal when the resolved URLs are equal; body, headers and method are ignored.
impl PartialEq for ResourceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ResourceDescriptor {}

/// A descriptor paired with the contract that decodes its response.
pub struct Resource<C: ResponseContract> {
    descriptor: ResourceDescriptor,
    contract: PhantomData<fn() -> C>,
}

impl<C: ResponseContract> Resource<C> {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            contract: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub(crate) fn with_body(self, body: Vec<u8>, content_type: &str) -> Self {
        Self::new(self.descriptor.with_body(body, content_type))
    }
}

impl<C: ResponseContract> Clone for Resource<C> {
    fn clone(&self) -> Self {
        Self::new(self.descriptor.clone())
    }
}

impl<C: ResponseContract> std::fmt::Debug for Resource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("method", &self.descriptor.method)
            .field("url", &self.descriptor.canonical())
            .field("auth", &self.descriptor.auth)
            .finish()
    }
}
