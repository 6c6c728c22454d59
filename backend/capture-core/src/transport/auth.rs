//! Login against the user center.
//!
//! Login uses the stored user email/password. When none exist an anonymous
//! user is created first with the client access token, which is itself
//! obtained through the client credentials grant when missing.

use super::Transport;

use crate::cancellation::CancellationToken;
use crate::credentials::UserCredentials;
use crate::error::{ApiError, ApiErrorKind};
use crate::resource::user_center;

use models::AccessToken;

use std::time::SystemTime;

use log::{debug, info, warn};

impl Transport {
    /// Log the end user in, creating an anonymous user if needed.
    pub async fn login(&self, token: Option<&CancellationToken>) -> Result<(), ApiError> {
        let _guard = self.login_lock.lock().await;
        self.login_locked(token).await
    }

    /// Forget the end user (credentials and tokens).
    pub fn logout(&self) {
        if let Err(e) = self.credentials.forget_user() {
            warn!("Failed to remove user credentials: {e}");
        }
        info!("User logged out");
    }

    pub(super) async fn login_locked(
        &self,
        token: Option<&CancellationToken>,
    ) -> Result<(), ApiError> {
        match self.credentials.user_credentials() {
            Some(user) => match self.login_user(&user, token).await {
                Err(e) if rejects_user(&e) => {
                    warn!("Stored user was rejected ({}), creating a new one", e.kind());
                    if let Err(e) = self.credentials.forget_user() {
                        warn!("Failed to remove rejected user: {e}");
                    }
                    let user = self.create_anonymous_user(token).await?;
                    self.login_user(&user, token).await
                }
                other => other,
            },
            None => {
                let user = self.create_anonymous_user(token).await?;
                self.login_user(&user, token).await
            }
        }
    }

    async fn login_user(
        &self,
        user: &UserCredentials,
        token: Option<&CancellationToken>,
    ) -> Result<(), ApiError> {
        let resource = user_center::login_user(&self.user_center, user);
        let response = self.attempt(&resource, token).await?;
        let access_token = AccessToken::from_response(response, SystemTime::now());

        if let Err(e) = self.credentials.save_user_token(&access_token) {
            warn!("Failed to store user access token: {e}");
        }

        debug!("User logged in");
        Ok(())
    }

    async fn create_anonymous_user(
        &self,
        token: Option<&CancellationToken>,
    ) -> Result<UserCredentials, ApiError> {
        self.ensure_client_token(token).await?;

        let domain = self
            .credentials
            .client_domain()
            .ok_or_else(|| ApiError::unauthorized("No client domain for anonymous user"))?;
        let user = UserCredentials::anonymous(&domain);

        let resource = user_center::create_user(&self.user_center, &user)?;
        self.attempt(&resource, token).await?;

        if let Err(e) = self.credentials.save_user_credentials(&user) {
            warn!("Failed to store anonymous user: {e}");
        }

        info!("Created anonymous user");
        Ok(user)
    }

    async fn ensure_client_token(&self, token: Option<&CancellationToken>) -> Result<(), ApiError> {
        if self.credentials.client_access_token().is_some() {
            return Ok(());
        }

        let resource = user_center::login_client(&self.user_center);
        let response = self.attempt(&resource, token).await?;
        let access_token = AccessToken::from_response(response, SystemTime::now());

        if let Err(e) = self.credentials.save_client_token(&access_token) {
            warn!("Failed to store client access token: {e}");
        }

        debug!("Client access token obtained");
        Ok(())
    }
}

/// The user center answers 400 (invalid_grant) or 401 for unknown users.
fn rejects_user(error: &ApiError) -> bool {
    matches!(
        error.kind(),
        ApiErrorKind::BadRequest | ApiErrorKind::Unauthorized
    )
}
