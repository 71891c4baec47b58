//! Transcript cache table access
//!
//! Entries carry an absolute expiry (unix seconds); expired rows are treated
//! as absent and removed by [`purge_expired`].

use mora_common::Result;
use sqlx::SqlitePool;

/// Read a non-expired payload
pub async fn get_entry(pool: &SqlitePool, cache_key: &str, now: i64) -> Result<Option<String>> {
    let payload: Option<String> = sqlx::query_scalar(
        "SELECT payload FROM transcript_cache WHERE cache_key = ? AND expires_at > ?",
    )
    .bind(cache_key)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(payload)
}

/// Insert or replace a payload
pub async fn put_entry(
    pool: &SqlitePool,
    cache_key: &str,
    payload: &str,
    expires_at: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transcript_cache (cache_key, payload, expires_at)
        VALUES (?, ?, ?)
        ON CONFLICT(cache_key) DO UPDATE SET
            payload = excluded.payload,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(cache_key)
    .bind(payload)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete expired rows, returning how many were removed
pub async fn purge_expired(pool: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM transcript_cache WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
