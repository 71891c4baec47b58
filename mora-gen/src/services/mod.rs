//! Services for mora-gen
//!
//! Collaborator traits with their HTTP / SQLite implementations, and the
//! pipeline driver that chains them.

pub mod code_extract;
pub mod code_synthesizer;
pub mod collaborator_error;
pub mod llm_client;
pub mod pipeline_driver;
pub mod prompts;
pub mod segment_planner;
pub mod session_repository;
pub mod timeline_assembler;
pub mod transcript_cache;
pub mod transcript_source;
pub mod video_url;

pub use code_synthesizer::{CodeSynthesizer, LlmCodeSynthesizer};
pub use collaborator_error::CollaboratorError;
pub use llm_client::ChatClient;
pub use pipeline_driver::{PipelineDriver, PipelineError};
pub use segment_planner::{LlmSegmentPlanner, SegmentPlanner};
pub use session_repository::{SessionRepository, SqliteSessionRepository};
pub use timeline_assembler::{LlmTimelineAssembler, TimelineAssembler};
pub use transcript_cache::{SqliteTranscriptCache, TranscriptCache};
pub use transcript_source::{BibiGptClient, TranscriptSource};
