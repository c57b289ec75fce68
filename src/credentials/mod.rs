//! Credential types and providers.
//!
//! A [`CredentialProvider`] hands out short-lived signing material for a
//! [`StorageTarget`]. Credentials are fetched fresh for every operation and
//! never cached by the browser.

mod env;

pub use env::EnvCredentialProvider;

use crate::config::StorageTarget;
use crate::error::{CredentialError, FileTransferError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Signing credentials for one operation.
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
    expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Create long-term credentials.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret_access_key.into()),
            session_token: None,
            expiration: None,
        }
    }

    /// Create session credentials.
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            session_token: Some(SecretString::new(session_token.into())),
            ..Self::new(access_key_id, secret_access_key)
        }
    }

    /// Create session credentials that expire.
    pub fn temporary(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            expiration: Some(expiration),
            ..Self::with_session_token(access_key_id, secret_access_key, session_token)
        }
    }

    /// Get the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key.
    ///
    /// Note: This exposes the secret. Avoid logging it.
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    /// Get the session token, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Get the expiration time, if any.
    pub fn expiration(&self) -> Option<&DateTime<Utc>> {
        self.expiration.as_ref()
    }

    /// Check if the credentials have expired.
    pub fn is_expired(&self) -> bool {
        self.expiration.map_or(false, |exp| Utc::now() >= exp)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Source of signing credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch credentials for the given target.
    async fn fetch_credentials(
        &self,
        target: &StorageTarget,
    ) -> Result<Credentials, FileTransferError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Provider that always returns the same credentials.
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a new static provider.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn fetch_credentials(
        &self,
        _target: &StorageTarget,
    ) -> Result<Credentials, FileTransferError> {
        if self.credentials.is_expired() {
            return Err(CredentialError::Expired {
                expiration: self
                    .credentials
                    .expiration()
                    .map(|e| e.to_rfc3339())
                    .unwrap_or_default(),
            }
            .into());
        }
        Ok(self.credentials.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

impl fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("credentials", &self.credentials)
            .finish()
    }
}
