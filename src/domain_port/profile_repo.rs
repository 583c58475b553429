use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<PublicProfile>, RelationError>;

    /// Missing ids are left out of the result; order is unspecified.
    async fn find_profiles(&self, user_ids: &[UserId])
    -> Result<Vec<PublicProfile>, RelationError>;
}
