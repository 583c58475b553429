use super::util::{placeholders, profile_from_row};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

pub struct MySqlProfileRepo {
    pool: MySqlPool,
}

impl MySqlProfileRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlProfileRepo { pool }
    }
}

#[async_trait::async_trait]
impl ProfileRepo for MySqlProfileRepo {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<PublicProfile>, RelationError> {
        let row = sqlx::query(
            "SELECT user_id, username, name, avatar_url FROM profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("select profile: {e}")))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_profiles(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<PublicProfile>, RelationError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT user_id, username, name, avatar_url FROM profiles WHERE user_id IN ({})",
            placeholders(user_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for user_id in user_ids {
            query = query.bind(*user_id);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RelationError::Store(format!("select profiles: {e}")))?;

        rows.iter().map(profile_from_row).collect()
    }
}
