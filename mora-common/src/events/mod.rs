//! Event types for the Mora session pipeline
//!
//! Provides the session event enum and the per-session [`EventChannel`].

// Sub-modules (supporting types)
mod channel;
mod pipeline_types;

pub use channel::{
    EventChannel, StreamItem, Subscription, DEFAULT_KEEP_ALIVE, DEFAULT_SUBSCRIBER_BUFFER,
};
pub use pipeline_types::{
    format_clock, CodeSegment, LineRange, Segment, Timeline, TimelineSegment, TranscriptEntry,
    VideoInfo, VideoTranscript,
};

use serde::{Deserialize, Serialize};

/// Session pipeline events
///
/// Every event a subscriber can observe for a session. Events are appended to
/// the session's [`EventChannel`] in pipeline order and serialized for SSE
/// transmission with the `type` tag doubling as the SSE event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Human-readable progress narration
    Thought {
        /// Narration text
        content: String,
    },

    /// Video metadata, emitted once the transcript has been fetched
    Video(VideoInfo),

    /// The planned segment list
    Plan {
        /// Planned segments in time order (1 to 5 entries)
        segments: Vec<Segment>,
    },

    /// One synthesized segment
    CodeSegment(CodeSegment),

    /// All segments synthesized
    CodeDone,

    /// Full summary of the synthesized segments
    SegmentsComplete {
        /// Number of code segments
        #[serde(rename = "totalSegments")]
        total_segments: usize,
        /// All code segments in plan order
        segments: Vec<CodeSegment>,
    },

    /// Final time → code line mapping
    Timeline(Timeline),

    /// Session completed successfully (terminal)
    Done,

    /// Session failed (terminal)
    Error {
        /// Stable machine-readable error code
        code: String,
        /// Underlying failure message, preserved verbatim
        message: String,
    },
}

impl SessionEvent {
    /// Convenience constructor for narration events
    pub fn thought(content: impl Into<String>) -> Self {
        SessionEvent::Thought {
            content: content.into(),
        }
    }

    /// Get the event type as a string (SSE event name)
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Thought { .. } => "thought",
            SessionEvent::Video(_) => "video",
            SessionEvent::Plan { .. } => "plan",
            SessionEvent::CodeSegment(_) => "code_segment",
            SessionEvent::CodeDone => "code_done",
            SessionEvent::SegmentsComplete { .. } => "segments_complete",
            SessionEvent::Timeline(_) => "timeline",
            SessionEvent::Done => "done",
            SessionEvent::Error { .. } => "error",
        }
    }

    /// `done` and `error` end the live feed
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Done | SessionEvent::Error { .. })
    }
}
