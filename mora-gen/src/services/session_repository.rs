//! Session persistence boundary

use async_trait::async_trait;
use mora_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Session;

/// Durable store of session snapshots
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or update the snapshot
    async fn save(&self, session: &Session) -> Result<()>;

    async fn load(&self, id: Uuid) -> Result<Option<Session>>;
}

/// SQLite implementation over the `sessions` table
pub struct SqliteSessionRepository {
    db: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn save(&self, session: &Session) -> Result<()> {
        crate::db::sessions::save_session(&self.db, session).await
    }

    async fn load(&self, id: Uuid) -> Result<Option<Session>> {
        crate::db::sessions::load_session(&self.db, id).await
    }
}
