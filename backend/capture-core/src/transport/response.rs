//! Buffered HTTP response kept for decoding and diagnostics.

use common::HttpStatusCode;

use std::fmt;

/// Longest body excerpt included in Display output.
const BODY_EXCERPT_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: HttpStatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: impl Into<HttpStatusCode>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: status.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Stand-in for a 401 when no usable credential exists, so the request is
    /// never dispatched without authorization.
    pub(crate) fn synthesized_unauthorized() -> Self {
        Self::new(HttpStatusCode::UNAUTHORIZED, Vec::new())
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = HttpStatusCode(response.status().as_u16());
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body_text();
        if body.is_empty() {
            return write!(f, "HTTP {}", self.status);
        }

        let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        write!(f, "HTTP {} - {}", self.status, excerpt)
    }
}
