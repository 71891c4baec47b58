//! Code synthesizer: one segment + its transcript slice → raw response
//!
//! The response is expected to contain a `<code>…</code>` region; extraction
//! happens in the pipeline driver.

use async_trait::async_trait;
use mora_common::events::{Segment, TranscriptEntry};
use std::sync::Arc;

use super::llm_client::{ChatClient, ResponseFormat};
use super::prompts;
use super::CollaboratorError;

/// Generates code for one planned segment
#[async_trait]
pub trait CodeSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        segment: &Segment,
        transcript: &[TranscriptEntry],
    ) -> Result<String, CollaboratorError>;
}

/// LLM-backed synthesizer
pub struct LlmCodeSynthesizer {
    chat: Arc<ChatClient>,
}

impl LlmCodeSynthesizer {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl CodeSynthesizer for LlmCodeSynthesizer {
    async fn synthesize(
        &self,
        segment: &Segment,
        transcript: &[TranscriptEntry],
    ) -> Result<String, CollaboratorError> {
        tracing::info!(
            description = %segment.description,
            time_range = %segment.time_range_label(),
            "Generating code for segment"
        );

        let prompt = prompts::synthesis_prompt(segment, transcript);
        self.chat
            .complete(
                prompts::SYNTHESIZER_SYSTEM,
                &prompt,
                ResponseFormat::Text,
                None,
            )
            .await
    }
}
