//! TwilioBackend against a local HTTP double.

use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ringer_core::domain::{
    BackendCallState, BackendErrorKind, CallRef, LookupError, MessagePayload, PhoneNumber,
};
use ringer_core::ports::{CallingBackend, CreateCall};
use ringer_twilio::{Credentials, TwilioBackend};

const SID: &str = "AC00000000000000000000000000000001";
const TOKEN: &str = "auth-token";
const CALLS: &str = "/2010-04-01/Accounts/AC00000000000000000000000000000001/Calls.json";

fn backend(server: &MockServer) -> TwilioBackend {
    TwilioBackend::new(Credentials::new(SID, TOKEN).unwrap())
        .unwrap()
        .with_base_url(server.uri())
}

fn say(message: &str) -> CreateCall {
    CreateCall {
        to: PhoneNumber::parse("+15550000001").unwrap(),
        from: PhoneNumber::parse("+15559990000").unwrap(),
        payload: MessagePayload::say(message, None),
    }
}

#[tokio::test]
async fn create_call_posts_form_and_returns_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS))
        .and(basic_auth(SID, TOKEN))
        .and(body_string_contains("To=%2B15550000001"))
        .and(body_string_contains("From=%2B15559990000"))
        .and(body_string_contains("Twiml="))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({
                "sid": "CA11111111111111111111111111111111",
                "status": "queued"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reference = backend(&server).create_call(&say("hello")).await.unwrap();
    assert_eq!(reference.as_str(), "CA11111111111111111111111111111111");
}

#[tokio::test]
async fn url_payload_is_sent_as_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS))
        .and(body_string_contains("Url=https%3A%2F%2Fexample.com%2Fvoice.xml"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "sid": "CA2", "status": "queued" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let call = CreateCall {
        payload: MessagePayload::Url("https://example.com/voice.xml".to_string()),
        ..say("unused")
    };
    let reference = backend(&server).create_call(&call).await.unwrap();
    assert_eq!(reference, CallRef::new("CA2"));
}

#[rstest]
#[case(401, json!({ "code": 20003, "message": "Authenticate" }), BackendErrorKind::Authentication)]
#[case(429, json!({ "code": 20429, "message": "Too Many Requests" }), BackendErrorKind::QuotaExceeded)]
#[case(400, json!({ "code": 21211, "message": "Invalid 'To' Phone Number" }), BackendErrorKind::InvalidDestination)]
#[case(400, json!({ "code": 21205, "message": "Url is not a valid URL" }), BackendErrorKind::Rejected)]
#[case(503, json!({ "message": "Service Unavailable" }), BackendErrorKind::Unavailable)]
#[tokio::test]
async fn create_call_errors_are_classified(
    #[case] status: u16,
    #[case] body: serde_json::Value,
    #[case] expected: BackendErrorKind,
) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;

    let err = backend(&server).create_call(&say("hello")).await.unwrap_err();
    assert_eq!(err.kind, expected);
    assert!(err.detail.starts_with(&format!("HTTP {status}")), "{}", err.detail);
}

#[tokio::test]
async fn unreachable_host_is_unavailable() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let b = TwilioBackend::new(Credentials::new(SID, TOKEN).unwrap())
        .unwrap()
        .with_base_url(uri);
    let err = b.create_call(&say("hello")).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Unavailable);
}

#[rstest]
#[case("initiated", BackendCallState::Queued)]
#[case("ringing", BackendCallState::Ringing)]
#[case("completed", BackendCallState::Completed)]
#[case("busy", BackendCallState::Busy)]
#[tokio::test]
async fn get_call_maps_status(#[case] raw: &str, #[case] expected: BackendCallState) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/2010-04-01/Accounts/AC00000000000000000000000000000001/Calls/CA3.json",
        ))
        .and(basic_auth(SID, TOKEN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "sid": "CA3", "status": raw })),
        )
        .mount(&server)
        .await;

    let state = backend(&server).get_call(&CallRef::new("CA3")).await.unwrap();
    assert_eq!(state, expected);
}

#[tokio::test]
async fn missing_call_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 20404,
            "message": "The requested resource was not found"
        })))
        .mount(&server)
        .await;

    let reference = CallRef::new("CA404");
    let err = backend(&server).get_call(&reference).await.unwrap_err();
    assert_eq!(err, LookupError::NotFound(reference));
}

#[tokio::test]
async fn lookup_auth_failure_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "code": 20003 })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .get_call(&CallRef::new("CA5"))
        .await
        .unwrap_err();
    match err {
        LookupError::Backend(e) => assert_eq!(e.kind, BackendErrorKind::Authentication),
        other => panic!("unexpected: {other:?}"),
    }
}
