//! Session state machine
//!
//! A session progresses `created → processing → {completed, error}`, with
//! `created → error` for sessions rejected before processing starts.
//! Terminal sessions are frozen: their results can no longer change.

use chrono::{DateTime, Utc};
use mora_common::events::{CodeSegment, Segment, Timeline, TranscriptEntry, VideoInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Registered, pipeline not started yet
    Created,
    /// Pipeline running
    Processing,
    /// Pipeline finished successfully
    Completed,
    /// Pipeline failed
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }

    /// Whether `self → next` is an allowed transition
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Created, SessionStatus::Processing)
                | (SessionStatus::Created, SessionStatus::Error)
                | (SessionStatus::Processing, SessionStatus::Completed)
                | (SessionStatus::Processing, SessionStatus::Error)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(SessionStatus::Created),
            "processing" => Ok(SessionStatus::Processing),
            "completed" => Ok(SessionStatus::Completed),
            "error" => Ok(SessionStatus::Error),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

/// Rejected session mutations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Invalid session status transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Session {0} is terminal and can no longer be modified")]
    Terminal(Uuid),

    #[error("Session already holds a code segment for each of its {planned} planned segments")]
    SegmentOverflow { planned: usize },
}

/// One video-to-code session
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) video_url: String,
    pub(crate) status: SessionStatus,
    pub(crate) video: Option<VideoInfo>,
    pub(crate) transcript: Option<Vec<TranscriptEntry>>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) code_segments: Vec<CodeSegment>,
    pub(crate) timeline: Option<Timeline>,
    pub(crate) error: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in `created` state
    pub fn new(video_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            video_url: video_url.into(),
            status: SessionStatus::Created,
            video: None,
            transcript: None,
            segments: Vec::new(),
            code_segments: Vec::new(),
            timeline: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn video(&self) -> Option<&VideoInfo> {
        self.video.as_ref()
    }

    pub fn transcript(&self) -> Option<&[TranscriptEntry]> {
        self.transcript.as_deref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn code_segments(&self) -> &[CodeSegment] {
        &self.code_segments
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to a new status, rejecting anything but forward moves
    pub fn transition_to(&mut self, next: SessionStatus) -> Result<(), SessionError> {
        if !self.status.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Move to `error` and record the failure message
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.transition_to(SessionStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Record the fetched video metadata and transcript
    pub fn set_transcript(
        &mut self,
        video: VideoInfo,
        entries: Vec<TranscriptEntry>,
    ) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        self.video = Some(video);
        self.transcript = Some(entries);
        self.touch();
        Ok(())
    }

    /// Record the planned segments
    pub fn set_segments(&mut self, segments: Vec<Segment>) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        self.segments = segments;
        self.touch();
        Ok(())
    }

    /// Append the next synthesized segment
    pub fn push_code_segment(&mut self, segment: CodeSegment) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        if self.code_segments.len() >= self.segments.len() {
            return Err(SessionError::SegmentOverflow {
                planned: self.segments.len(),
            });
        }
        self.code_segments.push(segment);
        self.touch();
        Ok(())
    }

    /// Record the assembled timeline
    pub fn set_timeline(&mut self, timeline: Timeline) -> Result<(), SessionError> {
        self.ensure_mutable()?;
        self.timeline = Some(timeline);
        self.touch();
        Ok(())
    }

    /// All synthesized code, segments separated by a blank line
    pub fn combined_code(&self) -> String {
        self.code_segments
            .iter()
            .map(|segment| segment.code.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Serializable view of the session
    pub fn snapshot(&self, event_count: usize) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            status: self.status,
            video_url: self.video_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            video: self.video.clone(),
            segments: self.segments.clone(),
            code_segments: self.code_segments.clone(),
            code: if self.code_segments.is_empty() {
                None
            } else {
                Some(self.combined_code())
            },
            timeline: self.timeline.clone(),
            error: self.error.clone(),
            event_count,
        }
    }

    fn ensure_mutable(&self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::Terminal(self.id));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Session snapshot returned by `GET /api/session/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoInfo>,
    pub segments: Vec<Segment>,
    pub code_segments: Vec<CodeSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub event_count: usize,
}
