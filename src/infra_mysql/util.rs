use crate::application_port::*;
use crate::domain_model::*;
use sqlx::Row;
use sqlx::mysql::MySqlRow;

pub fn edge_from_row(row: &MySqlRow) -> Result<FriendshipEdge, RelationError> {
    let decode = |e: sqlx::Error| RelationError::Store(format!("decode friendship row: {e}"));
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(FriendshipEdge {
        user_id: row.try_get("user_id").map_err(decode)?,
        friend_id: row.try_get("friend_id").map_err(decode)?,
        status: status.parse().map_err(RelationError::Store)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

pub fn profile_from_row(row: &MySqlRow) -> Result<PublicProfile, RelationError> {
    let decode = |e: sqlx::Error| RelationError::Store(format!("decode profile row: {e}"));
    Ok(PublicProfile {
        user_id: row.try_get("user_id").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        avatar_url: row.try_get("avatar_url").map_err(decode)?,
    })
}

pub fn notification_from_row(row: &MySqlRow) -> Result<Notification, NotificationError> {
    let decode = |e: sqlx::Error| NotificationError::Store(format!("decode notification row: {e}"));
    let type_name: String = row.try_get("type").map_err(decode)?;
    let data: String = row.try_get("data").map_err(decode)?;
    let data: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| NotificationError::Malformed(format!("data column: {e}")))?;
    let kind = NotificationKind::from_parts(&type_name, data)
        .map_err(|e| NotificationError::Malformed(format!("{type_name}: {e}")))?;
    Ok(Notification {
        id: row.try_get("id").map_err(decode)?,
        user_id: row.try_get("user_id").map_err(decode)?,
        kind,
        title: row.try_get("title").map_err(decode)?,
        body: row.try_get("body").map_err(decode)?,
        read: row.try_get("is_read").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

/// `?, ?, ?` for an `IN (...)` list of `n` binds.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
