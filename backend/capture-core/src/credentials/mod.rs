//! Credential storage.
//!
//! # Features
//! - `CredentialStore` trait: get/set/delete/clear over (service class, key)
//! - Whole logical credentials are written with one `set_all` call
//! - In-memory store for tests and ephemeral sessions
//! - File-backed store with atomic writes
//!
//! # Security
//! - Values are `RedactedSecret` (safe Debug impl, zeroized on drop)
//! - Values are never logged

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::InMemoryCredentialStore;

use crate::error::CredentialStoreError;
use crate::resource::UserAuth;

use common::RedactedSecret;
use models::{AccessToken, TokenType};

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, warn};
use uuid::Uuid;

/// Grouping of credential keys, mirroring keychain service attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceClass {
    Client,
    User,
}

impl ServiceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceClass::Client => "client",
            ServiceClass::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialKey {
    ClientId,
    ClientSecret,
    ClientDomain,
    ClientAccessToken,
    ClientTokenExpiration,
    UserAccessToken,
    UserTokenExpiration,
    UserEmail,
    UserPassword,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 9] = [
        CredentialKey::ClientId,
        CredentialKey::ClientSecret,
        CredentialKey::ClientDomain,
        CredentialKey::ClientAccessToken,
        CredentialKey::ClientTokenExpiration,
        CredentialKey::UserAccessToken,
        CredentialKey::UserTokenExpiration,
        CredentialKey::UserEmail,
        CredentialKey::UserPassword,
    ];

    pub fn service_class(&self) -> ServiceClass {
        match self {
            CredentialKey::ClientId
            | CredentialKey::ClientSecret
            | CredentialKey::ClientDomain
            | CredentialKey::ClientAccessToken
            | CredentialKey::ClientTokenExpiration => ServiceClass::Client,
            CredentialKey::UserAccessToken
            | CredentialKey::UserTokenExpiration
            | CredentialKey::UserEmail
            | CredentialKey::UserPassword => ServiceClass::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::ClientId => "clientId",
            CredentialKey::ClientSecret => "clientSecret",
            CredentialKey::ClientDomain => "clientDomain",
            CredentialKey::ClientAccessToken => "clientAccessToken",
            CredentialKey::ClientTokenExpiration => "clientTokenExpiration",
            CredentialKey::UserAccessToken => "userAccessToken",
            CredentialKey::UserTokenExpiration => "userTokenExpiration",
            CredentialKey::UserEmail => "userEmail",
            CredentialKey::UserPassword => "userPassword",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored value.
#[derive(Debug, Clone)]
pub struct CredentialItem {
    pub service_class: ServiceClass,
    pub key: CredentialKey,
    pub value: RedactedSecret,
}

impl CredentialItem {
    pub fn new(key: CredentialKey, value: impl Into<RedactedSecret>) -> Self {
        Self {
            service_class: key.service_class(),
            key,
            value: value.into(),
        }
    }
}

/// Secure persistent key/value storage for client and user credentials.
///
/// Implementations must apply `set_all`/`delete_all` atomically: readers
/// never observe half of a logical credential.
pub trait CredentialStore: Send + Sync {
    fn get(
        &self,
        service_class: ServiceClass,
        key: CredentialKey,
    ) -> Result<Option<RedactedSecret>, CredentialStoreError>;

    fn set_all(&self, items: Vec<CredentialItem>) -> Result<(), CredentialStoreError>;

    fn delete_all(
        &self,
        service_class: ServiceClass,
        keys: &[CredentialKey],
    ) -> Result<(), CredentialStoreError>;

    fn clear_all(&self) -> Result<(), CredentialStoreError>;

    fn set(&self, item: CredentialItem) -> Result<(), CredentialStoreError> {
        self.set_all(vec![item])
    }

    fn delete(
        &self,
        service_class: ServiceClass,
        key: CredentialKey,
    ) -> Result<(), CredentialStoreError> {
        self.delete_all(service_class, &[key])
    }
}

/// Client id/secret/domain registered with the user center.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub id: String,
    pub secret: RedactedSecret,
    pub domain: String,
}

/// End-user login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub email: String,
    pub password: RedactedSecret,
}

impl UserCredentials {
    /// Fresh anonymous user `<uuid>@<domain>` with a random password.
    pub fn anonymous(domain: &str) -> Self {
        Self {
            email: format!("{}@{}", Uuid::new_v4(), domain),
            password: RedactedSecret::new(Uuid::new_v4().to_string()),
        }
    }
}

/// Typed view over a [`CredentialStore`].
///
/// Read failures are logged and treated as "no credential", which sends the
/// caller down the unauthorized path instead of failing with a storage error.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn read(&self, key: CredentialKey) -> Option<RedactedSecret> {
        match self.store.get(key.service_class(), key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("Failed to read credential '{key}': {e}");
                None
            }
        }
    }

    pub fn save_client_credentials(
        &self,
        client: &ClientCredentials,
    ) -> Result<(), CredentialStoreError> {
        self.store.set_all(vec![
            CredentialItem::new(CredentialKey::ClientId, client.id.as_str()),
            CredentialItem::new(CredentialKey::ClientSecret, client.secret.clone()),
            CredentialItem::new(CredentialKey::ClientDomain, client.domain.as_str()),
        ])
    }

    pub fn client_domain(&self) -> Option<String> {
        self.read(CredentialKey::ClientDomain)
            .map(|d| d.expose().to_string())
    }

    /// `Authorization` value for the client: `Basic base64(id:secret)`.
    pub fn client_basic_authorization(&self) -> Option<RedactedSecret> {
        let id = self.read(CredentialKey::ClientId)?;
        let secret = self.read(CredentialKey::ClientSecret)?;
        let encoded = BASE64.encode(format!("{}:{}", id.expose(), secret.expose()));
        Some(RedactedSecret::new(format!("Basic {encoded}")))
    }

    pub fn client_access_token(&self) -> Option<AccessToken> {
        self.read_token(CredentialKey::ClientAccessToken, CredentialKey::ClientTokenExpiration)
    }

    pub fn user_access_token(&self) -> Option<AccessToken> {
        self.read_token(CredentialKey::UserAccessToken, CredentialKey::UserTokenExpiration)
    }

    pub fn save_client_token(&self, token: &AccessToken) -> Result<(), CredentialStoreError> {
        self.write_token(
            token,
            CredentialKey::ClientAccessToken,
            CredentialKey::ClientTokenExpiration,
        )
    }

    pub fn save_user_token(&self, token: &AccessToken) -> Result<(), CredentialStoreError> {
        self.write_token(
            token,
            CredentialKey::UserAccessToken,
            CredentialKey::UserTokenExpiration,
        )
    }

    /// Drop the stored user access token (401 on a user-authorized call).
    pub fn invalidate_user_token(&self) -> Result<(), CredentialStoreError> {
        debug!("Invalidating stored user access token");
        self.store.delete_all(
            ServiceClass::User,
            &[CredentialKey::UserAccessToken, CredentialKey::UserTokenExpiration],
        )
    }

    pub fn user_credentials(&self) -> Option<UserCredentials> {
        let email = self.read(CredentialKey::UserEmail)?;
        let password = self.read(CredentialKey::UserPassword)?;
        Some(UserCredentials {
            email: email.expose().to_string(),
            password,
        })
    }

    pub fn save_user_credentials(
        &self,
        user: &UserCredentials,
    ) -> Result<(), CredentialStoreError> {
        self.store.set_all(vec![
            CredentialItem::new(CredentialKey::UserEmail, user.email.as_str()),
            CredentialItem::new(CredentialKey::UserPassword, user.password.clone()),
        ])
    }

    /// Remove every user-scoped value (login and token).
    pub fn forget_user(&self) -> Result<(), CredentialStoreError> {
        self.store.delete_all(
            ServiceClass::User,
            &[
                CredentialKey::UserAccessToken,
                CredentialKey::UserTokenExpiration,
                CredentialKey::UserEmail,
                CredentialKey::UserPassword,
            ],
        )
    }

    /// Authorization header value for a user-level credential.
    pub fn user_authorization(&self, variant: UserAuth) -> Option<RedactedSecret> {
        match variant {
            UserAuth::Basic => self.client_basic_authorization(),
            UserAuth::Bearer => self
                .user_access_token()
                .map(|token| RedactedSecret::new(token.authorization_value())),
        }
    }

    /// Stored tokens are always bearer tokens; only value and expiration are kept.
    fn read_token(
        &self,
        value_key: CredentialKey,
        expiration_key: CredentialKey,
    ) -> Option<AccessToken> {
        let value = self.read(value_key)?;

        let expiration = match self.read(expiration_key) {
            Some(raw) => match humantime::parse_rfc3339(raw.expose()) {
                Ok(expiration) => expiration,
                Err(e) => {
                    warn!("Ignoring stored '{value_key}' with unreadable expiration: {e}");
                    return None;
                }
            },
            None => {
                debug!("Stored '{value_key}' has no expiration, treating as absent");
                return None;
            }
        };

        let token = AccessToken {
            value,
            token_type: TokenType::Bearer,
            expiration,
            scope: None,
        };

        if token.is_expired_at(SystemTime::now()) {
            debug!("Stored '{value_key}' has expired");
            return None;
        }

        Some(token)
    }

    fn write_token(
        &self,
        token: &AccessToken,
        value_key: CredentialKey,
        expiration_key: CredentialKey,
    ) -> Result<(), CredentialStoreError> {
        if token.token_type != TokenType::Bearer {
            warn!(
                "Storing '{value_key}' of type {}; it will be sent as a bearer token",
                token.token_type.scheme()
            );
        }

        self.store.set_all(vec![
            CredentialItem::new(value_key, token.value.clone()),
            CredentialItem::new(
                expiration_key,
                humantime::format_rfc3339(token.expiration).to_string(),
            ),
        ])
    }
}
