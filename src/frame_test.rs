use super::*;

#[test]
fn connect_frame_announces_version_one() {
    assert_eq!(
        connect(),
        serde_json::json!({ "msg": "connect", "version": "1", "support": ["1"] })
    );
}

#[test]
fn token_login_uses_resume_form() {
    let frame = login_with_token("c1", "T1");
    assert_eq!(frame["msg"], "method");
    assert_eq!(frame["method"], "login");
    assert_eq!(frame["id"], "c1");
    assert_eq!(frame["params"], serde_json::json!([{ "resume": "T1" }]));
}

#[test]
fn password_login_carries_digest_not_plaintext() {
    let frame = login_with_password("c1", "alice", "hunter2");
    let param = &frame["params"][0];
    assert_eq!(param["user"]["username"], "alice");
    assert_eq!(param["password"]["algorithm"], "sha-256");
    assert_eq!(param["password"]["digest"], password_digest("hunter2"));
    assert!(!frame.to_string().contains("hunter2"));
}

#[test]
fn password_digest_is_stable_sha256_hex() {
    // Well-known SHA-256 vector.
    assert_eq!(
        password_digest("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(password_digest("hunter2"), password_digest("hunter2"));
}

#[test]
fn subscribe_frame_names_stream_room_messages() {
    assert_eq!(
        subscribe("s1", "room-1"),
        serde_json::json!({
            "msg": "sub",
            "id": "s1",
            "name": "stream-room-messages",
            "params": ["room-1", false],
        })
    );
}

#[test]
fn unsubscribe_frame_references_original_id() {
    assert_eq!(unsubscribe("s1"), serde_json::json!({ "msg": "unsub", "id": "s1" }));
}

#[test]
fn pong_frame_has_no_id() {
    assert_eq!(pong(), serde_json::json!({ "msg": "pong" }));
}

#[test]
fn method_frame_carries_caller_params() {
    let frame = method("m1", "sendMessage", serde_json::json!([{ "rid": "r1" }]));
    assert_eq!(frame["msg"], "method");
    assert_eq!(frame["method"], "sendMessage");
    assert_eq!(frame["id"], "m1");
    assert_eq!(frame["params"][0]["rid"], "r1");
}

#[test]
fn inbound_ping_is_classified_as_keepalive() {
    let frame = InboundFrame::parse(r#"{"msg":"ping"}"#);
    assert!(frame.is_ping());
    assert_eq!(frame.id, None);
}

#[test]
fn inbound_reply_exposes_correlation_id() {
    let frame = InboundFrame::parse(r#"{"msg":"result","id":"m1","result":{}}"#);
    assert!(!frame.is_ping());
    assert_eq!(frame.id.as_deref(), Some("m1"));
}

#[test]
fn chat_text_mentioning_ping_is_not_a_keepalive() {
    let frame = InboundFrame::parse(r#"{"msg":"changed","fields":{"text":"ping me later"}}"#);
    assert!(!frame.is_ping());
}

#[test]
fn inbound_parse_tolerates_extra_fields() {
    let frame = InboundFrame::parse(r#"{"msg":"ping","extra":{"k":1},"count":3}"#);
    assert!(frame.is_ping());

    let frame = InboundFrame::parse(r#"{"id":"m1","collection":"x","fields":{}}"#);
    assert_eq!(frame.id.as_deref(), Some("m1"));
    assert_eq!(frame.msg, None);
}

#[test]
fn non_json_text_is_a_plain_push_frame() {
    let frame = InboundFrame::parse("not json at all");
    assert!(!frame.is_ping());
    assert_eq!(frame.msg, None);
    assert_eq!(frame.raw, "not json at all");
}
