use super::*;

#[test]
fn cancellation_is_detected_on_send_and_receive() {
    assert!(ClientError::cancelled_send().is_cancellation());
    assert!(ClientError::cancelled_receive().is_cancellation());
}

#[test]
fn other_errors_are_not_cancellation() {
    assert!(!ClientError::Connect("refused".to_owned()).is_cancellation());
    assert!(!ClientError::Send("socket closed".to_owned()).is_cancellation());
    assert!(!ClientError::NoActiveSubscription("s1".to_owned()).is_cancellation());
}

#[test]
fn no_active_subscription_names_the_id() {
    let err = ClientError::NoActiveSubscription("sub-42".to_owned());
    assert_eq!(err.to_string(), "no active subscription with id `sub-42`");
}

#[test]
fn api_error_carries_status_and_body() {
    let err = ClientError::Api { status: 401, body: "{\"status\":\"error\"}".to_owned() };
    assert!(err.to_string().contains("401"));
}
