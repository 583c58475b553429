use crate::domain_model::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Publishes each notification as JSON on `<prefix>:<recipient id>`.
pub struct RedisNotificationPublisher {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisNotificationPublisher {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisNotificationPublisher {
            conn,
            prefix: prefix.into(),
        }
    }

    fn channel(&self, recipient: UserId) -> String {
        channel_name(&self.prefix, recipient)
    }
}

pub fn channel_name(prefix: &str, recipient: UserId) -> String {
    format!("{}:{}", prefix, recipient)
}

#[async_trait::async_trait]
impl NotificationPublisher for RedisNotificationPublisher {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()> {
        let payload = serde_json::to_string(notification)?;
        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(self.channel(notification.user_id), payload)
            .await?;
        tracing::trace!(id = %notification.id, receivers, "notification published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_keyed_by_recipient() {
        let user = UserId(uuid::Uuid::nil());
        assert_eq!(
            channel_name("notifications", user),
            "notifications:00000000-0000-0000-0000-000000000000"
        );
    }
}
