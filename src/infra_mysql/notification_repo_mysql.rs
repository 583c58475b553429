use super::util::notification_from_row;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, title, body, data, is_read, created_at";

pub struct MySqlNotificationRepo {
    pool: MySqlPool,
}

impl MySqlNotificationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlNotificationRepo { pool }
    }
}

#[async_trait::async_trait]
impl NotificationRepo for MySqlNotificationRepo {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationError> {
        let data = notification
            .kind
            .data()
            .map_err(|e| NotificationError::Malformed(e.to_string()))?;

        sqlx::query(
            r#"
INSERT INTO notifications (id, user_id, type, title, body, data, is_read, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.type_name())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(data.to_string())
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("insert notification: {e}")))?;

        Ok(())
    }

    async fn list_for(
        &self,
        user_id: UserId,
        page_size: PageSize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError> {
        let rows = sqlx::query(&format!(
            r#"
SELECT {NOTIFICATION_COLUMNS}
FROM notifications
WHERE user_id = ?
  AND (? = FALSE OR is_read = FALSE)
ORDER BY created_at DESC, id DESC
LIMIT ?
"#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(page_size.0 as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("list notifications: {e}")))?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationError> {
        // MySQL reports matched-but-unchanged rows as 0, so count matches separately
        let matched: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("find notification: {e}")))?;
        if matched == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("mark notification read: {e}")))?;

        Ok(true)
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, NotificationError> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("mark all notifications read: {e}")))?;

        Ok(res.rows_affected())
    }

    async fn delete(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationError> {
        let res = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::Store(format!("delete notification: {e}")))?;

        Ok(res.rows_affected() > 0)
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64, NotificationError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| NotificationError::Store(format!("count unread notifications: {e}")))?;

        Ok(count as u64)
    }
}
