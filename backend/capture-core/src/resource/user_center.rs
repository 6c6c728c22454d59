//! User center resources: token grants and anonymous user creation.

use crate::credentials::UserCredentials;
use crate::error::ApiError;
use crate::resource::{
    AuthKind, Empty, Json, Resource, ResourceDescriptor, ServiceDomain, ServiceEndpoint,
    UserAuth,
};

use models::TokenResponse;

use reqwest::Method;
use serde_json::json;

const TOKEN_PATH: &str = "/oauth/token";
const USERS_PATH: &str = "/api/users";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Client credentials grant, authorized with the client id/secret.
pub fn login_client(endpoint: &ServiceEndpoint) -> Resource<Json<TokenResponse>> {
    Resource::new(
        ResourceDescriptor::new(
            ServiceDomain::UserCenter,
            endpoint,
            Method::POST,
            TOKEN_PATH,
            AuthKind::User(UserAuth::Basic),
        )
        .with_query("grant_type", "client_credentials")
        .with_header("Accept", JSON_CONTENT_TYPE),
    )
}

/// Password grant for the end user, authorized with the client id/secret.
pub fn login_user(
    endpoint: &ServiceEndpoint,
    user: &UserCredentials,
) -> Resource<Json<TokenResponse>> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("username", &user.email)
        .append_pair("password", user.password.expose())
        .finish();

    Resource::new(
        ResourceDescriptor::new(
            ServiceDomain::UserCenter,
            endpoint,
            Method::POST,
            TOKEN_PATH,
            AuthKind::User(UserAuth::Basic),
        )
        .with_query("grant_type", "password")
        .with_header("Accept", JSON_CONTENT_TYPE)
        .with_body(body.into_bytes(), FORM_CONTENT_TYPE),
    )
}

/// Create a user, authorized with the client access token.
pub fn create_user(
    endpoint: &ServiceEndpoint,
    user: &UserCredentials,
) -> Result<Resource<Empty>, ApiError> {
    let body = serde_json::to_vec(&json!({
        "email": user.email,
        "password": user.password.expose(),
    }))
    .map_err(|e| ApiError::unknown(format!("Cannot encode user: {e}")))?;

    Ok(Resource::new(
        ResourceDescriptor::new(
            ServiceDomain::UserCenter,
            endpoint,
            Method::POST,
            USERS_PATH,
            AuthKind::Client,
        )
        .with_body(body, JSON_CONTENT_TYPE),
    ))
}
