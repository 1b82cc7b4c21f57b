//! REST wire types and HTTP error classification.

use reqwest::StatusCode;
use serde::Deserialize;

use ringer_core::domain::{BackendCallState, BackendErrorKind, UnknownCallState};

/// Vendor error codes meaning the "To" number was refused.
pub const INVALID_TO_CODES: [u32; 3] = [21211, 21214, 13224];

/// The parts of a Call resource we read.
#[derive(Debug, Clone, Deserialize)]
pub struct CallResource {
    pub sid: String,
    pub status: String,
}

/// Error document returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Falls back to the raw text when the body is not the vendor's JSON.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self {
            code: None,
            message: (!raw.trim().is_empty()).then(|| raw.trim().to_string()),
        })
    }

    pub fn describe(&self, status: StatusCode) -> String {
        let message = self
            .message
            .as_deref()
            .or(status.canonical_reason())
            .unwrap_or("no message");
        match self.code {
            Some(code) => format!("HTTP {}: {message} (code {code})", status.as_u16()),
            None => format!("HTTP {}: {message}", status.as_u16()),
        }
    }
}

pub fn classify(status: StatusCode, body: &ApiErrorBody) -> BackendErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendErrorKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => BackendErrorKind::QuotaExceeded,
        StatusCode::BAD_REQUEST
            if body.code.is_some_and(|code| INVALID_TO_CODES.contains(&code)) =>
        {
            BackendErrorKind::InvalidDestination
        }
        s if s.is_server_error() => BackendErrorKind::Unavailable,
        _ => BackendErrorKind::Rejected,
    }
}

/// The API reports "initiated" before "queued"; both mean accepted, not yet ringing.
pub fn call_state(raw: &str) -> Result<BackendCallState, UnknownCallState> {
    match raw {
        "initiated" => Ok(BackendCallState::Queued),
        other => other.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, None, BackendErrorKind::Authentication)]
    #[case(403, None, BackendErrorKind::Authentication)]
    #[case(429, Some(20429), BackendErrorKind::QuotaExceeded)]
    #[case(400, Some(21211), BackendErrorKind::InvalidDestination)]
    #[case(400, Some(21214), BackendErrorKind::InvalidDestination)]
    #[case(400, Some(13224), BackendErrorKind::InvalidDestination)]
    #[case(400, Some(21205), BackendErrorKind::Rejected)]
    #[case(400, None, BackendErrorKind::Rejected)]
    #[case(404, Some(20404), BackendErrorKind::Rejected)]
    #[case(500, None, BackendErrorKind::Unavailable)]
    #[case(503, Some(20503), BackendErrorKind::Unavailable)]
    fn http_errors_are_classified(
        #[case] status: u16,
        #[case] code: Option<u32>,
        #[case] expected: BackendErrorKind,
    ) {
        let status = StatusCode::from_u16(status).unwrap();
        let body = ApiErrorBody { code, message: None };
        assert_eq!(classify(status, &body), expected);
    }

    #[rstest]
    #[case("initiated", BackendCallState::Queued)]
    #[case("queued", BackendCallState::Queued)]
    #[case("ringing", BackendCallState::Ringing)]
    #[case("in-progress", BackendCallState::InProgress)]
    #[case("no-answer", BackendCallState::NoAnswer)]
    #[case("canceled", BackendCallState::Canceled)]
    fn call_states_are_mapped(#[case] raw: &str, #[case] expected: BackendCallState) {
        assert_eq!(call_state(raw).unwrap(), expected);
    }

    #[test]
    fn unknown_call_state_is_an_error() {
        assert!(call_state("teleported").is_err());
    }

    #[test]
    fn error_body_falls_back_to_text() {
        let body = ApiErrorBody::parse("upstream timeout");
        assert_eq!(body.code, None);
        assert_eq!(
            body.describe(StatusCode::BAD_GATEWAY),
            "HTTP 502: upstream timeout"
        );
    }

    #[test]
    fn error_body_reads_vendor_json() {
        let body = ApiErrorBody::parse(
            r#"{"code": 21211, "message": "Invalid 'To' Phone Number", "more_info": "x", "status": 400}"#,
        );
        assert_eq!(body.code, Some(21211));
        assert_eq!(
            body.describe(StatusCode::BAD_REQUEST),
            "HTTP 400: Invalid 'To' Phone Number (code 21211)"
        );
    }
}
