use crate::{AccessToken, TokenResponse, TokenType};

use std::time::{Duration, SystemTime};

/// **VALUE**: Verifies that a token response is turned into an expiring access token.
///
/// **WHY THIS MATTERS**: Expired tokens are treated as absent, which drives the login path.
/// A wrong expiration either hammers the user center or sends dead tokens.
///
/// **BUG THIS CATCHES**: Would catch `expires_in` being ignored or misread as milliseconds.
#[test]
fn given_token_response_when_converted_then_expiration_is_relative_to_receipt() {
    let response: TokenResponse = serde_json::from_str(
        r#"{"access_token":"abc","token_type":"bearer","expires_in":43199,"scope":"write"}"#,
    )
    .unwrap();
    let received_at = SystemTime::now();

    let token = AccessToken::from_response(response, received_at);

    assert_eq!(token.expiration, received_at + Duration::from_secs(43199));
    assert_eq!(token.token_type, TokenType::Bearer);
    assert_eq!(token.scope.as_deref(), Some("write"));
    assert_eq!(token.authorization_value(), "Bearer abc");
    assert!(!token.is_expired_at(received_at));
    assert!(token.is_expired_at(received_at + Duration::from_secs(43200)));
}
