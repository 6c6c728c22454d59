use crate::HttpStatusCode;

/// **VALUE**: Verifies the 200-399 decode range used by response classification.
///
/// **WHY THIS MATTERS**: The transport only attempts contract decoding for this range;
/// every other status is mapped to an error kind.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one that treats 400 as decodable or 3xx as an error.
#[test]
fn given_status_codes_when_checking_decodable_then_only_200_to_399_qualify() {
    assert!(HttpStatusCode(200).is_decodable());
    assert!(HttpStatusCode(201).is_decodable());
    assert!(HttpStatusCode(304).is_decodable());
    assert!(HttpStatusCode(399).is_decodable());

    assert!(!HttpStatusCode(199).is_decodable());
    assert!(!HttpStatusCode(400).is_decodable());
    assert!(!HttpStatusCode(500).is_decodable());
}

/// **VALUE**: Verifies the named constants carry the codes the classifier matches on.
///
/// **WHY THIS MATTERS**: Error kinds are chosen by comparing against these constants.
///
/// **BUG THIS CATCHES**: Would catch a typo such as 503 written as 502.
#[test]
fn given_named_constants_when_compared_then_codes_match() {
    assert_eq!(HttpStatusCode::BAD_REQUEST, HttpStatusCode::from(400));
    assert_eq!(HttpStatusCode::UNAUTHORIZED.0, 401);
    assert_eq!(HttpStatusCode::NOT_FOUND.0, 404);
    assert_eq!(HttpStatusCode::NOT_ACCEPTABLE.0, 406);
    assert_eq!(HttpStatusCode::TOO_MANY_REQUESTS.0, 429);
    assert_eq!(HttpStatusCode::SERVICE_UNAVAILABLE.0, 503);
    assert_eq!(HttpStatusCode::SERVICE_UNAVAILABLE.to_string(), "503");
}
