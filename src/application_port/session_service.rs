use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
}

/// Resolves the identity of whoever is driving the client.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn current_user(&self) -> Result<UserId, AuthError>;
}
