//! Transcript cache keyed by video URL
//!
//! Lookups and writes are best-effort from the pipeline's point of view: a
//! failing cache behaves like a miss.

use async_trait::async_trait;
use chrono::Utc;
use mora_common::events::VideoTranscript;
use mora_common::{Error, Result};
use sqlx::SqlitePool;
use std::time::Duration;

/// Cache key for a video's transcript
pub fn cache_key(video_url: &str) -> String {
    format!("video:{}:subtitle", video_url)
}

/// Key-value store of fetched transcripts
#[async_trait]
pub trait TranscriptCache: Send + Sync {
    async fn get(&self, video_url: &str) -> Result<Option<VideoTranscript>>;
    async fn put(&self, video_url: &str, transcript: &VideoTranscript) -> Result<()>;
}

/// SQLite-backed cache with per-entry expiry
pub struct SqliteTranscriptCache {
    db: SqlitePool,
    ttl: Duration,
}

impl SqliteTranscriptCache {
    pub fn new(db: SqlitePool, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Remove expired entries
    pub async fn purge_expired(&self) -> Result<u64> {
        crate::db::cache::purge_expired(&self.db, Utc::now().timestamp()).await
    }
}

#[async_trait]
impl TranscriptCache for SqliteTranscriptCache {
    async fn get(&self, video_url: &str) -> Result<Option<VideoTranscript>> {
        let key = cache_key(video_url);
        let payload = crate::db::cache::get_entry(&self.db, &key, Utc::now().timestamp()).await?;

        payload
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    Error::Internal(format!("Failed to deserialize cached transcript: {}", e))
                })
            })
            .transpose()
    }

    async fn put(&self, video_url: &str, transcript: &VideoTranscript) -> Result<()> {
        let key = cache_key(video_url);
        let payload = serde_json::to_string(transcript)
            .map_err(|e| Error::Internal(format!("Failed to serialize transcript: {}", e)))?;
        let expires_at = Utc::now().timestamp() + self.ttl.as_secs() as i64;

        crate::db::cache::put_entry(&self.db, &key, &payload, expires_at).await?;
        tracing::debug!(cache_key = %key, "Transcript cached");
        Ok(())
    }
}
