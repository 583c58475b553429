use crate::application_port::*;
use crate::domain_model::*;

/// Notification rows. Every query except `insert` is scoped to the recipient.
#[async_trait::async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationError>;

    /// Newest first.
    async fn list_for(
        &self,
        user_id: UserId,
        page_size: PageSize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError>;

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationError>;

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, NotificationError>;

    async fn delete(&self, user_id: UserId, id: NotificationId)
    -> Result<bool, NotificationError>;

    async fn count_unread(&self, user_id: UserId) -> Result<u64, NotificationError>;
}
