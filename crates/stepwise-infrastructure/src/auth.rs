//! Config-based auth provider.

use async_trait::async_trait;
use std::sync::RwLock;
use stepwise_core::auth::AuthProvider;
use stepwise_core::config::AuthConfig;
use stepwise_core::error::{Result, StepwiseError};

#[derive(Debug, Clone)]
struct Credentials {
    user_id: String,
    token: String,
}

/// Auth provider holding a user id and bearer token from configuration.
///
/// A forced sign-out clears the credentials for the rest of the process and
/// remembers the reason so the host can show a session-expired notice.
#[derive(Debug, Default)]
pub struct StaticAuthProvider {
    credentials: RwLock<Option<Credentials>>,
    sign_out_reason: RwLock<Option<String>>,
}

impl StaticAuthProvider {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            credentials: RwLock::new(Some(Credentials {
                user_id: user_id.into(),
                token: token.into(),
            })),
            sign_out_reason: RwLock::new(None),
        }
    }

    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signed in when the config names a user; the token may be empty for local backends.
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.user_id {
            Some(user_id) => Self::new(user_id.clone(), config.token.clone().unwrap_or_default()),
            None => Self::signed_out(),
        }
    }

    /// Why the last forced sign-out happened, if any.
    pub fn sign_out_reason(&self) -> Option<String> {
        self.sign_out_reason
            .read()
            .map(|reason| reason.clone())
            .unwrap_or(None)
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    fn user_id(&self) -> Option<String> {
        self.credentials
            .read()
            .ok()
            .and_then(|credentials| credentials.as_ref().map(|c| c.user_id.clone()))
    }

    async fn bearer_token(&self) -> Result<String> {
        self.credentials
            .read()
            .map_err(|_| StepwiseError::internal("auth state poisoned"))?
            .as_ref()
            .map(|c| c.token.clone())
            .ok_or_else(|| StepwiseError::Unauthorized("not signed in".to_string()))
    }

    async fn force_sign_out(&self, reason: &str) {
        tracing::warn!("[Auth] Forced sign-out: {}", reason);
        if let Ok(mut credentials) = self.credentials.write() {
            *credentials = None;
        }
        if let Ok(mut last) = self.sign_out_reason.write() {
            *last = Some(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signed_in_provider() {
        let auth = StaticAuthProvider::new("u1", "tok");
        assert_eq!(auth.user_id().as_deref(), Some("u1"));
        assert_eq!(auth.bearer_token().await.unwrap(), "tok");
        assert!(auth.is_signed_in());
    }

    #[tokio::test]
    async fn test_force_sign_out_clears_credentials() {
        let auth = StaticAuthProvider::new("u1", "tok");
        auth.force_sign_out("token expired").await;

        assert!(auth.user_id().is_none());
        assert!(auth.bearer_token().await.unwrap_err().is_unauthorized());
        assert_eq!(auth.sign_out_reason().as_deref(), Some("token expired"));
    }

    #[test]
    fn test_from_config_without_user_is_signed_out() {
        let auth = StaticAuthProvider::from_config(&AuthConfig::default());
        assert!(!auth.is_signed_in());
    }
}
