use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("account sid is empty")]
    EmptyAccountSid,

    #[error("account sid must be alphanumeric, got {0:?}")]
    MalformedAccountSid(String),

    #[error("auth token is empty")]
    EmptyAuthToken,
}

/// Account SID and auth token. Read-only once built and shared by every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_sid: String,
    auth_token: String,
}

impl Credentials {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let account_sid = account_sid.into().trim().to_string();
        let auth_token = auth_token.into().trim().to_string();

        if account_sid.is_empty() {
            return Err(CredentialsError::EmptyAccountSid);
        }
        // goes into the URL path
        if !account_sid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CredentialsError::MalformedAccountSid(account_sid));
        }
        if auth_token.is_empty() {
            return Err(CredentialsError::EmptyAuthToken);
        }
        Ok(Self {
            account_sid,
            auth_token,
        })
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    pub(crate) fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
