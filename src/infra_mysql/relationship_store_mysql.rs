use super::util::edge_from_row;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use sqlx::{MySqlPool, Row};

const EDGE_COLUMNS: &str = "user_id, friend_id, status, created_at, updated_at";

pub struct MySqlRelationshipStore {
    pool: MySqlPool,
}

impl MySqlRelationshipStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRelationshipStore { pool }
    }
}

#[async_trait::async_trait]
impl RelationshipStore for MySqlRelationshipStore {
    async fn find_edge(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Option<FriendshipEdge>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {EDGE_COLUMNS} FROM friendships WHERE user_id = ? AND friend_id = ? AND status = ?"
        ))
        .bind(user_id)
        .bind(friend_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("select friendship edge: {e}")))?;

        row.as_ref().map(edge_from_row).transpose()
    }

    async fn find_edge_between(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<Option<FriendshipEdge>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {EDGE_COLUMNS} FROM friendships WHERE user_id = ? AND friend_id = ?"
        ))
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("select friendship edge: {e}")))?;

        row.as_ref().map(edge_from_row).transpose()
    }

    async fn upsert_pending(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipEdge, RelationError> {
        let now = Utc::now();
        sqlx::query(
            r#"
INSERT INTO friendships (user_id, friend_id, status, created_at, updated_at)
VALUES (?, ?, 'pending', ?, ?)
ON DUPLICATE KEY UPDATE status = 'pending', updated_at = VALUES(updated_at)
"#,
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("upsert pending friendship: {e}")))?;

        self.find_edge(user_id, friend_id, EdgeStatus::Pending)
            .await?
            .ok_or_else(|| RelationError::Store("upserted friendship edge vanished".to_string()))
    }

    async fn accept_friend_request(
        &self,
        requester_id: UserId,
        accepter_id: UserId,
    ) -> Result<bool, RelationError> {
        let store_err = |what: &str, e: sqlx::Error| RelationError::Store(format!("{what}: {e}"));
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_err("begin accept", e))?;

        let status: Option<String> = sqlx::query(
            "SELECT status FROM friendships WHERE user_id = ? AND friend_id = ? FOR UPDATE",
        )
        .bind(requester_id)
        .bind(accepter_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_err("lock friend request", e))?
        .map(|row| row.try_get::<String, _>("status"))
        .transpose()
        .map_err(|e| store_err("decode status", e))?;

        if status.as_deref() != Some(EdgeStatus::Pending.as_str()) {
            tx.rollback()
                .await
                .map_err(|e| store_err("rollback accept", e))?;
            return Ok(false);
        }

        let now = Utc::now();
        // order matters: request edge -> mirror edge
        sqlx::query(
            "UPDATE friendships SET status = 'active', updated_at = ? WHERE user_id = ? AND friend_id = ?",
        )
        .bind(now)
        .bind(requester_id)
        .bind(accepter_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_err("activate friend request", e))?;

        sqlx::query(
            r#"
INSERT INTO friendships (user_id, friend_id, status, created_at, updated_at)
VALUES (?, ?, 'active', ?, ?)
ON DUPLICATE KEY UPDATE status = 'active', updated_at = VALUES(updated_at)
"#,
        )
        .bind(accepter_id)
        .bind(requester_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_err("activate mirror edge", e))?;

        tx.commit()
            .await
            .map_err(|e| store_err("commit accept", e))?;
        Ok(true)
    }

    async fn reject_friend_request(
        &self,
        requester_id: UserId,
        target_id: UserId,
    ) -> Result<bool, RelationError> {
        let res = sqlx::query(
            "DELETE FROM friendships WHERE user_id = ? AND friend_id = ? AND status = 'pending'",
        )
        .bind(requester_id)
        .bind(target_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("delete friend request: {e}")))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_edges_from(
        &self,
        user_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError> {
        let rows = sqlx::query(&format!(
            "SELECT {EDGE_COLUMNS} FROM friendships WHERE user_id = ? AND status = ? ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("list edges from user: {e}")))?;

        rows.iter().map(edge_from_row).collect()
    }

    async fn list_edges_to(
        &self,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError> {
        let rows = sqlx::query(&format!(
            "SELECT {EDGE_COLUMNS} FROM friendships WHERE friend_id = ? AND status = ? ORDER BY updated_at DESC"
        ))
        .bind(friend_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("list edges to user: {e}")))?;

        rows.iter().map(edge_from_row).collect()
    }
}
