//! Authenticated transport.
//!
//! Every remote call goes through [`Transport::send`] (or its `download` and
//! `upload` flavors), which share one path:
//!
//! 1. Check the cancellation token (already cancelled → no traffic)
//! 2. Inject the authorization the resource asks for
//! 3. Dispatch as a registered task so a token can abort it
//! 4. Re-check the token on arrival
//! 5. Classify the status and decode per the resource's contract
//!
//! A 401 on a user-authorized primary API call invalidates the user access
//! token, logs in once and replays the request once.

mod auth;
pub mod response;
pub mod tasks;

use response::HttpResponse;
use tasks::TaskRegistry;

use crate::cancellation::CancellationToken;
use crate::config::SdkConfig;
use crate::credentials::{CredentialStore, Credentials};
use crate::error::{ApiError, CoreError};
use crate::resource::{
    AuthKind, RawBytes, Resource, ResourceDescriptor, ResponseContract, ServiceEndpoint,
};

use common::RedactedSecret;

use std::sync::Arc;

use log::{debug, trace, warn};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tokio::sync::Mutex as TokioMutex;

pub struct Transport {
    client: Client,
    credentials: Credentials,
    api: ServiceEndpoint,
    user_center: ServiceEndpoint,
    tasks: TaskRegistry,
    login_lock: TokioMutex<()>,
}

impl Transport {
    /// Build a transport and persist the configured client credentials.
    pub fn new(config: &SdkConfig, store: Arc<dyn CredentialStore>) -> Result<Self, CoreError> {
        let client_credentials = config.client_credentials()?;
        let credentials = Credentials::new(store);
        credentials.save_client_credentials(&client_credentials)?;

        let client = config.http_client()?;

        debug!(
            "Transport ready: api={}, user_center={}",
            config.api.base_url, config.api.user_center_url
        );

        Ok(Self {
            client,
            credentials,
            api: ServiceEndpoint::from_base_url(&config.api.base_url),
            user_center: ServiceEndpoint::from_base_url(&config.api.user_center_url),
            tasks: TaskRegistry::new(),
            login_lock: TokioMutex::new(()),
        })
    }

    pub fn api_endpoint(&self) -> &ServiceEndpoint {
        &self.api
    }

    pub fn user_center_endpoint(&self) -> &ServiceEndpoint {
        &self.user_center
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Network tasks aborted by cancellation tokens since startup.
    pub fn cancelled_task_count(&self) -> usize {
        self.tasks.cancelled_count()
    }

    pub fn in_flight_tasks(&self) -> usize {
        self.tasks.in_flight()
    }

    /// Data fetch.
    pub async fn send<C: ResponseContract>(
        &self,
        resource: &Resource<C>,
        token: Option<&CancellationToken>,
    ) -> Result<C::Output, ApiError> {
        match self.attempt(resource, token).await {
            Err(error)
                if error.is_unauthorized() && resource.descriptor().refreshes_on_unauthorized() =>
            {
                self.refresh_user_session(&error, token).await?;
                self.attempt(resource, token).await
            }
            other => other,
        }
    }

    /// Binary download.
    pub async fn download(
        &self,
        resource: &Resource<RawBytes>,
        token: Option<&CancellationToken>,
    ) -> Result<Vec<u8>, ApiError> {
        self.send(resource, token).await
    }

    /// Binary upload: `bytes` become the request body.
    pub async fn upload<C: ResponseContract>(
        &self,
        resource: Resource<C>,
        bytes: Vec<u8>,
        content_type: &str,
        token: Option<&CancellationToken>,
    ) -> Result<C::Output, ApiError> {
        let resource = resource.with_body(bytes, content_type);
        self.send(&resource, token).await
    }

    /// Invalidate the user token and log in again before a replay.
    async fn refresh_user_session(
        &self,
        cause: &ApiError,
        token: Option<&CancellationToken>,
    ) -> Result<(), ApiError> {
        let _guard = self.login_lock.lock().await;

        warn!("User authorization rejected ({cause}), logging in again");

        if let Err(e) = self.credentials.invalidate_user_token() {
            warn!("Failed to delete user access token: {e}");
        }

        match self.login_locked(token).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                warn!("Re-login failed: {e}");
                Err(ApiError::unauthorized(format!("Re-login failed: {e}")))
            }
        }
    }

    /// One dispatch, no refresh.
    async fn attempt<C: ResponseContract>(
        &self,
        resource: &Resource<C>,
        token: Option<&CancellationToken>,
    ) -> Result<C::Output, ApiError> {
        if token.is_some_and(CancellationToken::is_cancelled) {
            debug!("Request cancelled before dispatch");
            return Err(ApiError::cancelled());
        }

        let descriptor = resource.descriptor();
        let authorization = self.authorize(descriptor.auth())?;
        let request = self.build_request(descriptor, authorization.as_ref())?;

        debug!("{} {}", request.method(), request.url());

        let response = self.execute(request, token).await?;

        if token.is_some_and(CancellationToken::is_cancelled) {
            debug!("Discarding response for cancelled request");
            return Err(ApiError::cancelled());
        }

        trace!("Response: HTTP {}", response.status);
        classify::<C>(response)
    }

    fn authorize(&self, auth: AuthKind) -> Result<Option<RedactedSecret>, ApiError> {
        match auth {
            AuthKind::None => Ok(None),
            AuthKind::Client => match self.credentials.client_access_token() {
                Some(token) => Ok(Some(RedactedSecret::new(token.authorization_value()))),
                None => Err(ApiError::unauthorized("No client access token")),
            },
            AuthKind::User(variant) => match self.credentials.user_authorization(variant) {
                Some(value) => Ok(Some(value)),
                None => {
                    debug!("No user credential for {variant:?}, treating as 401");
                    Err(ApiError::from_response(HttpResponse::synthesized_unauthorized()))
                }
            },
        }
    }

    fn build_request(
        &self,
        descriptor: &ResourceDescriptor,
        authorization: Option<&RedactedSecret>,
    ) -> Result<reqwest::Request, ApiError> {
        let url = descriptor.url()?;

        let mut builder = self.client.request(descriptor.method().clone(), url);
        for (name, value) in descriptor.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization.expose());
        }
        if let Some(body) = descriptor.body() {
            builder = builder.body(body.to_vec());
        }

        builder
            .build()
            .map_err(|e| ApiError::unknown(format!("Cannot build request: {e}")))
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        token: Option<&CancellationToken>,
    ) -> Result<HttpResponse, ApiError> {
        let client = self.client.clone();
        let task = self.tasks.spawn(async move {
            match client.execute(request).await {
                Ok(response) => HttpResponse::read(response).await,
                Err(e) => Err(e),
            }
        });

        let id = task.id();
        if let Some(token) = token {
            token.attach(&self.tasks, id);
        }

        let result = task.join().await;

        if let Some(token) = token {
            token.detach(id);
        }

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ApiError::from(e)),
            Err(e) if e.is_cancelled() => Err(ApiError::cancelled()),
            Err(e) => Err(ApiError::unknown(format!("Network task failed: {e}"))),
        }
    }
}

fn classify<C: ResponseContract>(response: HttpResponse) -> Result<C::Output, ApiError> {
    if !response.status.is_decodable() {
        return Err(ApiError::from_response(response));
    }

    match C::decode(&response) {
        Ok(output) => Ok(output),
        Err(message) => Err(ApiError::parse(message, Some(response))),
    }
}
