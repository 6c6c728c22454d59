//! HTTP status codes as classified by the transport.

/// HTTP status code for error categorization.
///
/// Stored directly rather than parsed from error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const BAD_REQUEST: HttpStatusCode = HttpStatusCode(400);
    pub const UNAUTHORIZED: HttpStatusCode = HttpStatusCode(401);
    pub const NOT_FOUND: HttpStatusCode = HttpStatusCode(404);
    pub const NOT_ACCEPTABLE: HttpStatusCode = HttpStatusCode(406);
    pub const TOO_MANY_REQUESTS: HttpStatusCode = HttpStatusCode(429);
    pub const SERVICE_UNAVAILABLE: HttpStatusCode = HttpStatusCode(503);

    /// 2xx and 3xx responses carry a body worth decoding.
    pub fn is_decodable(&self) -> bool {
        (200..400).contains(&self.0)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
