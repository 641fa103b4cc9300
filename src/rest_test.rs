use super::*;

#[test]
fn login_body_prefers_session_token() {
    let credentials = Credentials::Password {
        username: "alice".to_owned(),
        password: "secret".to_owned(),
    };
    assert_eq!(
        login_body(Some("T1"), &credentials),
        serde_json::json!({ "resume": "T1" })
    );
}

#[test]
fn login_body_falls_back_to_username_password() {
    let credentials = Credentials::Password {
        username: "alice".to_owned(),
        password: "secret".to_owned(),
    };
    assert_eq!(
        login_body(None, &credentials),
        serde_json::json!({ "username": "alice", "password": "secret" })
    );
}

#[test]
fn login_body_uses_configured_token_when_session_is_empty() {
    let credentials = Credentials::Token("T2".to_owned());
    assert_eq!(login_body(None, &credentials), serde_json::json!({ "resume": "T2" }));
}

#[test]
fn login_tokens_are_extracted_from_response_data() {
    let response = serde_json::json!({
        "status": "success",
        "data": { "userId": "u-1", "authToken": "tok-1", "me": {} }
    });
    let (token, user_id) = extract_login_tokens(&response);
    assert_eq!(token.as_deref(), Some("tok-1"));
    assert_eq!(user_id.as_deref(), Some("u-1"));
}

#[test]
fn missing_login_fields_extract_as_none() {
    let (token, user_id) = extract_login_tokens(&serde_json::json!({ "status": "error" }));
    assert_eq!(token, None);
    assert_eq!(user_id, None);
}

#[test]
fn decode_body_parses_a_successful_json_response() {
    let value = decode_body(reqwest::StatusCode::OK, r#"{"success":true}"#.to_owned())
        .expect("valid JSON body");
    assert_eq!(value, serde_json::json!({ "success": true }));
}

#[test]
fn decode_body_rejects_a_successful_non_json_response() {
    let err = decode_body(reqwest::StatusCode::OK, "<html>proxy page</html>".to_owned())
        .expect_err("non-JSON body");
    assert!(matches!(err, ClientError::Json(_)));
}

#[test]
fn decode_body_carries_the_error_body_verbatim() {
    let err = decode_body(reqwest::StatusCode::UNAUTHORIZED, "You must be logged in".to_owned())
        .expect_err("error status");
    match err {
        ClientError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "You must be logged in");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_tokens_in_the_shared_session() {
    // Exercise the session plumbing the way `login` does, without a server.
    let config = ClientConfig::with_password("chat.test", "alice", "secret");
    let auth = session::shared_from_credentials(&config.credentials);

    let response = serde_json::json!({
        "data": { "userId": "u-9", "authToken": "tok-9" }
    });
    let (token, user_id) = extract_login_tokens(&response);
    session::store(&auth, token, user_id);

    let state = session::read(&auth);
    assert_eq!(state.auth_token.as_deref(), Some("tok-9"));
    assert_eq!(state.user_id.as_deref(), Some("u-9"));
}
