use crate::RedactedSecret;

/// **VALUE**: Verifies that secrets never appear in Debug or Display output.
///
/// **WHY THIS MATTERS**: Client secrets, passwords and access tokens flow through
/// structs that are logged with `{:?}`. A leak here ends up in log files.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug impl replacing the manual one.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    let secret = RedactedSecret::new("super-secret-password");

    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    assert!(!debug.contains("super-secret-password"));
    assert!(!display.contains("super-secret-password"));
    assert_eq!(secret.expose(), "super-secret-password");
    assert_eq!(secret.len(), 21);
}

/// **VALUE**: Verifies that serializing a secret fails loudly.
///
/// **WHY THIS MATTERS**: Persisting a secret must be an explicit `expose()` call in a
/// credential store, never an accidental `serde_json::to_string` of a token struct.
///
/// **BUG THIS CATCHES**: Would catch a derived Serialize impl.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    let secret = RedactedSecret::from("token-value");

    let result = serde_json::to_string(&secret);

    assert!(result.is_err(), "Secrets must not be serializable");
}
