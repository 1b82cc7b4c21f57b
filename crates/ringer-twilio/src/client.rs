//! TwilioBackend - REST API 上の CallingBackend
//!
//! - create_call: `POST /2010-04-01/Accounts/{sid}/Calls.json`（form: To, From, Twiml | Url）
//! - get_call: `GET /2010-04-01/Accounts/{sid}/Calls/{call_sid}.json`
//! - 認証は Basic（account sid / auth token）

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::debug;

use ringer_core::domain::{
    BackendCallState, BackendError, CallRef, LookupError, MessagePayload,
};
use ringer_core::ports::{CallingBackend, CreateCall};

use crate::credentials::Credentials;
use crate::wire::{ApiErrorBody, CallResource, call_state, classify};

pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

const API_VERSION: &str = "2010-04-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct TwilioBackend {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl TwilioBackend {
    pub fn new(credentials: Credentials) -> Result<Self, TwilioError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ringer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        })
    }

    /// Point at another API host (regional edge, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Calls.json",
            self.base_url,
            self.credentials.account_sid()
        )
    }

    fn call_url(&self, call_sid: &str) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Calls/{call_sid}.json",
            self.base_url,
            self.credentials.account_sid()
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(
            self.credentials.account_sid(),
            Some(self.credentials.auth_token()),
        )
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    BackendError::unavailable(format!("request failed: {e}"))
}

async fn error_from_response(status: StatusCode, response: Response) -> BackendError {
    let raw = response.text().await.unwrap_or_default();
    let body = ApiErrorBody::parse(&raw);
    BackendError::new(classify(status, &body), body.describe(status))
}

#[async_trait]
impl CallingBackend for TwilioBackend {
    async fn create_call(&self, call: &CreateCall) -> Result<CallRef, BackendError> {
        let mut form = vec![("To", call.to.as_str()), ("From", call.from.as_str())];
        match &call.payload {
            MessagePayload::Markup(markup) => form.push(("Twiml", markup.as_str())),
            MessagePayload::Url(url) => form.push(("Url", url.as_str())),
        }

        debug!(to = %call.to, "POST Calls.json");
        let response = self
            .authed(self.http.post(self.calls_url()))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        // the call may already be queued, so this must not look retryable as an outage
        let resource: CallResource = response.json().await.map_err(|e| {
            BackendError::rejected(format!("unreadable create-call response: {e}"))
        })?;
        debug!(to = %call.to, sid = %resource.sid, status = %resource.status, "call created");
        Ok(CallRef::new(resource.sid))
    }

    async fn get_call(&self, reference: &CallRef) -> Result<BackendCallState, LookupError> {
        let sid = reference.as_str();
        if sid.is_empty() || !sid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LookupError::NotFound(reference.clone()));
        }

        let response = self
            .authed(self.http.get(self.call_url(sid)))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(reference.clone()));
        }
        if !status.is_success() {
            return Err(error_from_response(status, response).await.into());
        }

        let resource: CallResource = response.json().await.map_err(|e| {
            BackendError::rejected(format!("unreadable call resource: {e}"))
        })?;
        let state = call_state(&resource.status)
            .map_err(|e| BackendError::rejected(e.to_string()))?;
        debug!(%reference, %state, "call fetched");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> TwilioBackend {
        TwilioBackend::new(Credentials::new("AC0123", "token").unwrap()).unwrap()
    }

    #[test]
    fn urls_follow_the_account() {
        let b = backend().with_base_url("http://localhost:8080/");
        assert_eq!(b.base_url(), "http://localhost:8080");
        assert_eq!(
            b.calls_url(),
            "http://localhost:8080/2010-04-01/Accounts/AC0123/Calls.json"
        );
        assert_eq!(
            b.call_url("CA9"),
            "http://localhost:8080/2010-04-01/Accounts/AC0123/Calls/CA9.json"
        );
    }

    #[test]
    fn defaults_to_public_api() {
        assert_eq!(backend().base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn odd_references_are_not_found_without_a_request() {
        // unroutable base url: any request would fail as Unavailable
        let b = backend().with_base_url("http://127.0.0.1:1");
        let reference = CallRef::new("../Accounts");
        assert_eq!(
            b.get_call(&reference).await,
            Err(LookupError::NotFound(reference))
        );
    }
}
