//! Authentication provider trait.
//!
//! The provider supplies a stable user identifier and a bearer token. The
//! client never handles credentials itself.

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Stable identifier of the signed-in learner, `None` when signed out.
    fn user_id(&self) -> Option<String>;

    /// Bearer token for backend requests.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when nobody is signed in.
    async fn bearer_token(&self) -> Result<String>;

    /// Drops the current sign-in after the backend rejected the token.
    async fn force_sign_out(&self, reason: &str);

    fn is_signed_in(&self) -> bool {
        self.user_id().is_some()
    }
}
