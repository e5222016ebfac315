//! Service credential model.
//!
//! A closed tagged union: each variant carries only its own required
//! fields, so "is this field required for this kind" is decided by the
//! type, not by runtime checks. Construction-time validation is the
//! one place in this workspace where errors surface as `Err` rather
//! than logged booleans — an empty required field is a programming or
//! configuration error, not an operational failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Persisted, RecordMeta};

/// A required credential field was missing or empty.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0} is required for {1} credentials")]
pub struct MissingField(pub &'static str, pub &'static str);

/// Authentication material for an external service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "credential_type", rename_all = "snake_case")]
pub enum Credentials {
    EmailPassword {
        email: String,
        password: String,
    },
    ApiKey {
        api_key: String,
    },
    #[serde(rename = "oauth")]
    OAuth {
        oauth_token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_token: Option<String>,
    },
}

impl Credentials {
    pub fn email_password(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, MissingField> {
        let email = email.into();
        let password = password.into();
        if email.is_empty() {
            return Err(MissingField("email", "email_password"));
        }
        if password.is_empty() {
            return Err(MissingField("password", "email_password"));
        }
        Ok(Self::EmailPassword { email, password })
    }

    pub fn api_key(api_key: impl Into<String>) -> Result<Self, MissingField> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MissingField("api_key", "api_key"));
        }
        Ok(Self::ApiKey { api_key })
    }

    pub fn oauth(
        oauth_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Result<Self, MissingField> {
        let oauth_token = oauth_token.into();
        if oauth_token.is_empty() {
            return Err(MissingField("oauth_token", "oauth"));
        }
        Ok(Self::OAuth {
            oauth_token,
            refresh_token,
        })
    }

    /// The serialized tag for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmailPassword { .. } => "email_password",
            Self::ApiKey { .. } => "api_key",
            Self::OAuth { .. } => "oauth",
        }
    }
}

/// A named service account with its credentials, persisted as one
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub credentials: Credentials,
    pub enabled: bool,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Account {
    pub fn new(name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            name: name.into(),
            credentials,
            enabled: true,
            meta: RecordMeta::now(),
        }
    }
}

impl Persisted for Account {
    const RECORD_NAME: &'static str = "Account";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
