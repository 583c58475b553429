use crate::application_port::{AuthError, SessionService};
use crate::domain_model::UserId;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct FakeSessionService {
    user: RwLock<Option<UserId>>,
}

impl FakeSessionService {
    pub fn signed_in(user: UserId) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Stable id for a username, so demos can refer to people by name.
    pub fn for_username(username: &str) -> Self {
        Self::signed_in(get_fake_id(username))
    }

    pub fn switch_to(&self, user: Option<UserId>) {
        if let Ok(mut slot) = self.user.write() {
            *slot = user;
        }
    }
}

#[async_trait::async_trait]
impl SessionService for FakeSessionService {
    async fn current_user(&self) -> Result<UserId, AuthError> {
        self.user
            .read()
            .map_err(|_| AuthError::NotSignedIn)?
            .ok_or(AuthError::NotSignedIn)
    }
}

pub fn get_fake_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}
