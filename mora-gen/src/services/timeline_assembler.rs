//! Timeline assembler: transcript + combined code → time/line mapping

use async_trait::async_trait;
use mora_common::events::{Timeline, VideoTranscript};
use std::sync::Arc;

use super::llm_client::{ChatClient, ResponseFormat};
use super::prompts;
use super::CollaboratorError;

/// Maps video time ranges to code line ranges
#[async_trait]
pub trait TimelineAssembler: Send + Sync {
    async fn assemble(
        &self,
        transcript: &VideoTranscript,
        code: &str,
    ) -> Result<Timeline, CollaboratorError>;
}

/// Parse an assembler reply of the form `{"segments": [...]}`
///
/// A timeline without segments is treated as an empty response.
pub fn parse_timeline(content: &str) -> Result<Timeline, CollaboratorError> {
    let timeline: Timeline =
        serde_json::from_str(content).map_err(|e| CollaboratorError::Parse(e.to_string()))?;
    if timeline.segments.is_empty() {
        return Err(CollaboratorError::EmptyResponse("timeline assembler".to_string()));
    }
    Ok(timeline)
}

/// LLM-backed assembler
pub struct LlmTimelineAssembler {
    chat: Arc<ChatClient>,
}

impl LlmTimelineAssembler {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl TimelineAssembler for LlmTimelineAssembler {
    async fn assemble(
        &self,
        transcript: &VideoTranscript,
        code: &str,
    ) -> Result<Timeline, CollaboratorError> {
        let prompt = prompts::timeline_prompt(transcript, code);
        let content = self
            .chat
            .complete(
                prompts::TIMELINE_SYSTEM,
                &prompt,
                ResponseFormat::JsonObject,
                Some(0.1),
            )
            .await?;

        let timeline = parse_timeline(&content)?;
        tracing::info!(segments = timeline.segments.len(), "Timeline generated");
        Ok(timeline)
    }
}
