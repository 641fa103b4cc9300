use super::*;

#[test]
fn initialize_accepts_a_plain_host() {
    let client = RocketChatClient::with_token("chat.example.org", "T1");
    client.initialize().expect("valid config");
}

#[test]
fn initialize_rejects_an_empty_host() {
    let client = RocketChatClient::with_password("", "alice", "secret");
    assert!(matches!(client.initialize(), Err(ClientError::InvalidHost(_))));
}

#[test]
fn configured_token_is_visible_immediately() {
    let client = RocketChatClient::with_token("chat.example.org", "T1");
    assert_eq!(client.auth_token().as_deref(), Some("T1"));
    assert_eq!(client.user_id(), None);
}

#[test]
fn password_client_starts_without_a_token() {
    let client = RocketChatClient::with_password("chat.example.org", "alice", "secret");
    assert_eq!(client.auth_token(), None);
}

#[tokio::test]
async fn cleanup_is_idempotent_without_a_connection() {
    let client = RocketChatClient::with_token("chat.example.org", "T1");
    client.cleanup().await;
    client.cleanup().await;
    assert!(client.streamed_messages().is_empty());
}
