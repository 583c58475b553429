use crate::domain_model::Notification;

/// Real-time channel keyed by recipient; subscribers receive each inserted notification.
#[async_trait::async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()>;
}
