use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;

/// Looks up the language a learner is studying
#[async_trait]
pub trait UserLanguagePreferenceLookup: Send + Sync {
    /// `Ok(None)` when the user is unknown or has no preference
    async fn target_language(&self, user_id: &str) -> Result<Option<String>, String>;
}

/// Reads `users.target_language` from Postgres
pub struct PgUserLanguageRepository {
    pool: Arc<DbPool>,
}

impl PgUserLanguageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLanguagePreferenceLookup for PgUserLanguageRepository {
    async fn target_language(&self, user_id: &str) -> Result<Option<String>, String> {
        let pool = self.pool.as_ref();
        let language = sqlx::query_scalar::<_, Option<String>>(
            "SELECT target_language FROM users WHERE id::text = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| e.to_string())?;

        Ok(language.flatten())
    }
}

/// Used when no user database is configured
pub struct NoopUserLanguageRepository;

#[async_trait]
impl UserLanguagePreferenceLookup for NoopUserLanguageRepository {
    async fn target_language(&self, _user_id: &str) -> Result<Option<String>, String> {
        Ok(None)
    }
}
