use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification not found")]
    NotFound,
    #[error("malformed notification: {0}")]
    Malformed(String),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    async fn create_notification(
        &self,
        new: NewNotification,
    ) -> Result<Notification, NotificationError>;
    async fn list_notifications(
        &self,
        me: UserId,
        page_size: PageSize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError>;
    async fn mark_read(&self, me: UserId, id: NotificationId) -> Result<(), NotificationError>;
    async fn mark_all_read(&self, me: UserId) -> Result<u64, NotificationError>;
    async fn delete_notification(
        &self,
        me: UserId,
        id: NotificationId,
    ) -> Result<(), NotificationError>;
    async fn unread_count(&self, me: UserId) -> Result<u64, NotificationError>;
}
