//! Segment planner: transcript → ordered list of content segments
//!
//! The planner only proposes; the pipeline driver enforces the segment cap
//! and falls back to a whole-video segment when planning fails.

use async_trait::async_trait;
use mora_common::events::{Segment, VideoTranscript};
use serde::Deserialize;
use std::sync::Arc;

use super::llm_client::{ChatClient, ResponseFormat};
use super::prompts;
use super::CollaboratorError;

/// Plans the segments of a video
#[async_trait]
pub trait SegmentPlanner: Send + Sync {
    async fn plan(&self, transcript: &VideoTranscript) -> Result<Vec<Segment>, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Parse a planner reply of the form `{"segments": [...]}`
pub fn parse_plan(content: &str) -> Result<Vec<Segment>, CollaboratorError> {
    let plan: PlanResponse =
        serde_json::from_str(content).map_err(|e| CollaboratorError::Parse(e.to_string()))?;
    Ok(plan.segments)
}

/// LLM-backed planner
pub struct LlmSegmentPlanner {
    chat: Arc<ChatClient>,
    max_segments: usize,
}

impl LlmSegmentPlanner {
    pub fn new(chat: Arc<ChatClient>, max_segments: usize) -> Self {
        Self { chat, max_segments }
    }
}

#[async_trait]
impl SegmentPlanner for LlmSegmentPlanner {
    async fn plan(&self, transcript: &VideoTranscript) -> Result<Vec<Segment>, CollaboratorError> {
        let prompt = prompts::planning_prompt(transcript, self.max_segments);
        let content = self
            .chat
            .complete(
                prompts::PLANNER_SYSTEM,
                &prompt,
                ResponseFormat::JsonObject,
                Some(0.2),
            )
            .await?;

        let segments = parse_plan(&content)?;
        for (i, segment) in segments.iter().enumerate() {
            tracing::debug!(
                segment = i + 1,
                start = segment.start_time,
                end = segment.end_time,
                description = %segment.description,
                "Planned segment"
            );
        }
        Ok(segments)
    }
}
