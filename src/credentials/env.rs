//! Environment variable credential provider.

use super::{CredentialProvider, Credentials};
use crate::config::StorageTarget;
use crate::error::{CredentialError, FileTransferError};
use async_trait::async_trait;
use std::env;

/// Environment variable names for AWS credentials.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret access key variable.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Session token variable.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Credential provider that reads from environment variables.
///
/// Variables are read on every call, so rotated values are picked up without
/// rebuilding the provider.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider {
    access_key_var: Option<String>,
    secret_key_var: Option<String>,
    session_token_var: Option<String>,
}

impl EnvCredentialProvider {
    /// Create a provider with the standard AWS variable names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with custom variable names.
    pub fn with_vars(
        access_key_var: impl Into<String>,
        secret_key_var: impl Into<String>,
        session_token_var: Option<String>,
    ) -> Self {
        Self {
            access_key_var: Some(access_key_var.into()),
            secret_key_var: Some(secret_key_var.into()),
            session_token_var,
        }
    }

    fn access_key_var(&self) -> &str {
        self.access_key_var.as_deref().unwrap_or(AWS_ACCESS_KEY_ID)
    }

    fn secret_key_var(&self) -> &str {
        self.secret_key_var.as_deref().unwrap_or(AWS_SECRET_ACCESS_KEY)
    }

    fn session_token_var(&self) -> &str {
        self.session_token_var.as_deref().unwrap_or(AWS_SESSION_TOKEN)
    }

    fn read_required(&self, name: &str) -> Result<String, CredentialError> {
        let value = env::var(name).map_err(|_| CredentialError::NotFound {
            message: format!("{} is not set", name),
        })?;
        if value.is_empty() {
            return Err(CredentialError::Invalid {
                message: format!("{} is empty", name),
            });
        }
        Ok(value)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn fetch_credentials(
        &self,
        _target: &StorageTarget,
    ) -> Result<Credentials, FileTransferError> {
        let access_key_id = self.read_required(self.access_key_var())?;
        let secret_access_key = self.read_required(self.secret_key_var())?;

        let session_token = env::var(self.session_token_var())
            .ok()
            .filter(|s| !s.is_empty());

        Ok(match session_token {
            Some(token) => Credentials::with_session_token(access_key_id, secret_access_key, token),
            None => Credentials::new(access_key_id, secret_access_key),
        })
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}
