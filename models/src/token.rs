//! OAuth access tokens.

use common::RedactedSecret;

use std::time::{Duration, SystemTime};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Bearer,
    Basic,
}

impl TokenType {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("basic") {
            TokenType::Basic
        } else {
            TokenType::Bearer
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            TokenType::Bearer => "Bearer",
            TokenType::Basic => "Basic",
        }
    }
}

/// Wire shape of a successful token call.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A usable access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub value: RedactedSecret,
    pub token_type: TokenType,
    pub expiration: SystemTime,
    pub scope: Option<String>,
}

/// Lifetime assumed when the server omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

impl AccessToken {
    pub fn new(value: impl Into<RedactedSecret>, expiration: SystemTime) -> Self {
        Self {
            value: value.into(),
            token_type: TokenType::Bearer,
            expiration,
            scope: None,
        }
    }

    pub fn from_response(response: TokenResponse, received_at: SystemTime) -> Self {
        let lifetime = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Self {
            value: RedactedSecret::new(response.access_token),
            token_type: TokenType::parse(&response.token_type),
            expiration: received_at + lifetime,
            scope: response.scope,
        }
    }

    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expiration
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// Value for the `Authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type.scheme(), self.value.expose())
    }
}
