//! Session snapshot persistence

use chrono::{DateTime, Utc};
use mora_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Session, SessionStatus};

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", what, e)))
}

fn from_json<T: DeserializeOwned>(value: &str, what: &str) -> Result<T> {
    serde_json::from_str(value)
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", what, e)))
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", what, e)))
}

/// Insert or update the session row
pub async fn save_session(pool: &SqlitePool, session: &Session) -> Result<()> {
    // Prepare all data BEFORE acquiring database connection
    let id = session.id().to_string();
    let video_info = session
        .video()
        .map(|video| to_json(video, "video info"))
        .transpose()?;
    let transcript = session
        .transcript()
        .map(|entries| to_json(entries, "transcript"))
        .transpose()?;
    let segments = to_json(session.segments(), "segments")?;
    let code_segments = to_json(session.code_segments(), "code segments")?;
    let timeline = session
        .timeline()
        .map(|timeline| to_json(timeline, "timeline"))
        .transpose()?;
    let generated_code = if session.code_segments().is_empty() {
        None
    } else {
        Some(session.combined_code())
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (
            id, video_url, status, video_info, transcript, segments,
            code_segments, timeline, generated_code, error_message,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            video_info = excluded.video_info,
            transcript = excluded.transcript,
            segments = excluded.segments,
            code_segments = excluded.code_segments,
            timeline = excluded.timeline,
            generated_code = excluded.generated_code,
            error_message = excluded.error_message,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&id)
    .bind(session.video_url())
    .bind(session.status().as_str())
    .bind(&video_info)
    .bind(&transcript)
    .bind(&segments)
    .bind(&code_segments)
    .bind(&timeline)
    .bind(&generated_code)
    .bind(session.error())
    .bind(session.created_at().to_rfc3339())
    .bind(session.updated_at().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a session from database
pub async fn load_session(pool: &SqlitePool, session_id: Uuid) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, video_url, status, video_info, transcript, segments,
               code_segments, timeline, error_message, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let status: String = row.get("status");
    let status: SessionStatus = status.parse().map_err(Error::Internal)?;

    let video_info: Option<String> = row.get("video_info");
    let transcript: Option<String> = row.get("transcript");
    let segments: String = row.get("segments");
    let code_segments: String = row.get("code_segments");
    let timeline: Option<String> = row.get("timeline");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Some(Session {
        id: session_id,
        video_url: row.get("video_url"),
        status,
        video: video_info
            .map(|json| from_json(&json, "video info"))
            .transpose()?,
        transcript: transcript
            .map(|json| from_json(&json, "transcript"))
            .transpose()?,
        segments: from_json(&segments, "segments")?,
        code_segments: from_json(&code_segments, "code segments")?,
        timeline: timeline
            .map(|json| from_json(&json, "timeline"))
            .transpose()?,
        error: row.get("error_message"),
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    }))
}

/// Number of persisted sessions
pub async fn count_sessions(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
