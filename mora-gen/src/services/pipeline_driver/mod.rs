//! Session pipeline driver
//!
//! Runs one session through its stages in order and narrates progress on the
//! session's event channel.
//!
//! # State Progression
//! VALIDATE → TRANSCRIPT → PLAN → SYNTHESIZE → TIMELINE → FINALIZE
//!
//! Each stage lives in its own `phase_*` module:
//!
//! - **VALIDATE**: supported platform check, no collaborator calls
//! - **TRANSCRIPT**: cache lookup, transcript fetch, duration ceiling
//! - **PLAN**: segment planning, capped at `max_segments`
//! - **SYNTHESIZE**: sequential per-segment code generation
//! - **TIMELINE**: time → code line mapping, then finalization
//!
//! # Stage policy
//! Transcript fetch and synthesis are load-bearing: a failure or timeout ends
//! the session with an `error` event. Planning and timeline assembly are
//! advisory: a failure or timeout is logged at WARN and replaced by a
//! whole-video default. See [`Stage::policy`].

use mora_common::events::SessionEvent;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{
    CodeSynthesizer, CollaboratorError, SegmentPlanner, SessionRepository, TimelineAssembler,
    TranscriptCache, TranscriptSource,
};
use crate::config::PipelineConfig;
use crate::models::{SessionError, SessionStatus};
use crate::session_store::SessionEntry;

// Phase modules (internal implementation)
mod phase_planning;
mod phase_synthesis;
mod phase_timeline;
mod phase_transcript;
mod phase_validate;

/// Stage that calls an external collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcript,
    Planning,
    Synthesis,
    Timeline,
}

/// What a stage failure means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    /// Failure ends the session
    LoadBearing,
    /// Failure is replaced by a default and the session continues
    Advisory,
}

impl Stage {
    pub fn policy(&self) -> StagePolicy {
        match self {
            Stage::Transcript | Stage::Synthesis => StagePolicy::LoadBearing,
            Stage::Planning | Stage::Timeline => StagePolicy::Advisory,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcript => "transcript",
            Stage::Planning => "planning",
            Stage::Synthesis => "synthesis",
            Stage::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal pipeline failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Unsupported video URL: {0}")]
    InvalidVideoUrl(String),

    #[error("Video is too long: {duration}s exceeds the {max}s limit")]
    VideoTooLong { duration: f64, max: f64 },

    #[error("Invalid video duration: {0}s")]
    InvalidDuration(f64),

    #[error("Transcript fetch failed: {0}")]
    TranscriptFetch(CollaboratorError),

    #[error("No transcript available for this video")]
    NoTranscript,

    #[error("Code generation failed for segment {segment}: {source}")]
    Synthesis {
        /// 1-based segment number
        segment: usize,
        source: CollaboratorError,
    },

    #[error("The {stage} stage timed out after {limit:?}")]
    StageTimeout { stage: Stage, limit: Duration },

    #[error("Session exceeded its deadline of {0:?}")]
    SessionDeadline(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stable machine-readable code carried by the `error` event
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidVideoUrl(_) => "INVALID_VIDEO_URL",
            PipelineError::VideoTooLong { .. } => "VIDEO_TOO_LONG",
            PipelineError::InvalidDuration(_) => "INVALID_DURATION",
            PipelineError::TranscriptFetch(_) => "TRANSCRIPT_ERROR",
            PipelineError::NoTranscript => "NO_TRANSCRIPT",
            PipelineError::Synthesis { .. } => "SYNTHESIS_ERROR",
            PipelineError::StageTimeout { .. } => "STAGE_TIMEOUT",
            PipelineError::SessionDeadline(_) => "SESSION_DEADLINE",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<SessionError> for PipelineError {
    fn from(e: SessionError) -> Self {
        PipelineError::Internal(e.to_string())
    }
}

/// Pipeline driver service
pub struct PipelineDriver {
    transcript_source: Arc<dyn TranscriptSource>,
    planner: Arc<dyn SegmentPlanner>,
    synthesizer: Arc<dyn CodeSynthesizer>,
    assembler: Arc<dyn TimelineAssembler>,
    cache: Option<Arc<dyn TranscriptCache>>,
    repository: Option<Arc<dyn SessionRepository>>,
    config: PipelineConfig,
}

impl PipelineDriver {
    pub fn new(
        transcript_source: Arc<dyn TranscriptSource>,
        planner: Arc<dyn SegmentPlanner>,
        synthesizer: Arc<dyn CodeSynthesizer>,
        assembler: Arc<dyn TimelineAssembler>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transcript_source,
            planner,
            synthesizer,
            assembler,
            cache: None,
            repository: None,
            config,
        }
    }

    /// Consult and populate a transcript cache
    pub fn with_cache(mut self, cache: Arc<dyn TranscriptCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Write session snapshots through at stage boundaries
    pub fn with_repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the session to completion
    ///
    /// Never returns an error: failures end the session in `error` state with
    /// a terminal `error` event. Returns the final status.
    pub async fn run(&self, entry: Arc<SessionEntry>) -> SessionStatus {
        let start_time = std::time::Instant::now();

        info!(session_id = %entry.id(), "Starting session pipeline");

        match self.execute(&entry).await {
            Ok(()) => {
                info!(
                    session_id = %entry.id(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Session pipeline completed"
                );
                SessionStatus::Completed
            }
            Err(e) => self.fail(&entry, &e).await,
        }
    }

    /// Spawn the pipeline under a supervisor task
    ///
    /// The driver runs in an inner task. A panic in it, or an exceeded
    /// session deadline, is turned into `error` state plus a terminal `error`
    /// event so subscribers are never left waiting.
    pub fn spawn_supervised(self: &Arc<Self>, entry: Arc<SessionEntry>) -> JoinHandle<SessionStatus> {
        let driver = Arc::clone(self);

        tokio::spawn(async move {
            let session_id = entry.id();
            let mut inner = {
                let driver = Arc::clone(&driver);
                let entry = Arc::clone(&entry);
                tokio::spawn(async move { driver.run(entry).await })
            };

            let joined = match driver.config.session_deadline() {
                Some(limit) => match tokio::time::timeout(limit, &mut inner).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        inner.abort();
                        warn!(session_id = %session_id, ?limit, "Session deadline exceeded - aborting pipeline");
                        return driver
                            .fail(&entry, &PipelineError::SessionDeadline(limit))
                            .await;
                    }
                },
                None => inner.await,
            };

            match joined {
                Ok(status) => status,
                Err(join_error) => {
                    error!(
                        session_id = %session_id,
                        error = %join_error,
                        "Pipeline task terminated abnormally"
                    );
                    driver
                        .fail(
                            &entry,
                            &PipelineError::Internal(format!(
                                "Pipeline task terminated abnormally: {}",
                                join_error
                            )),
                        )
                        .await
                }
            }
        })
    }

    async fn execute(&self, entry: &SessionEntry) -> Result<(), PipelineError> {
        // Phase 1: VALIDATE - created → processing
        self.phase_validate(entry).await?;

        // Phase 2: TRANSCRIPT - load-bearing
        let transcript = self.phase_transcript(entry).await?;

        // Phase 3: PLAN - advisory
        let segments = self.phase_planning(entry, &transcript).await?;

        // Phase 4: SYNTHESIZE - load-bearing
        self.phase_synthesis(entry, &transcript, &segments).await?;

        // Phase 5: TIMELINE - advisory, then finalize
        self.phase_timeline(entry, &transcript).await?;
        self.finalize(entry).await
    }

    /// Move the session to `error` and append the terminal event
    ///
    /// A session that already ended keeps its status. If its task died before
    /// the terminal event went out, the event matching that status is appended
    /// so the channel still closes. Returns the final status.
    async fn fail(&self, entry: &SessionEntry, err: &PipelineError) -> SessionStatus {
        let message = err.to_string();
        let status = {
            let mut session = entry.session().write().await;
            if session.is_terminal() {
                warn!(
                    session_id = %entry.id(),
                    status = session.status().as_str(),
                    error = %message,
                    "Failure reported for a session that already ended - status kept"
                );
                if !entry.events().is_closed() {
                    self.emit(entry, terminal_event(session.status(), session.error()));
                }
            } else {
                if let Err(e) = session.fail(message.clone()) {
                    warn!(session_id = %entry.id(), error = %e, "Failed to record session error");
                }
                error!(
                    session_id = %entry.id(),
                    code = err.code(),
                    error = %message,
                    "Session pipeline failed"
                );
                // Status and terminal event change together under the session lock
                self.emit(
                    entry,
                    SessionEvent::Error {
                        code: err.code().to_string(),
                        message,
                    },
                );
            }
            session.status()
        };

        self.settle(entry).await;
        status
    }

    /// Final write-through, then release the entry for eviction
    async fn settle(&self, entry: &SessionEntry) {
        self.persist(entry).await;
        entry.mark_settled();
    }

    fn emit(&self, entry: &SessionEntry, event: SessionEvent) {
        entry.events().append(event);
    }

    fn thought(&self, entry: &SessionEntry, content: impl Into<String>) {
        self.emit(entry, SessionEvent::thought(content));
    }

    /// Write-through of the current session state (failures only logged)
    async fn persist(&self, entry: &SessionEntry) {
        let Some(repository) = &self.repository else {
            return;
        };
        let snapshot = entry.session().read().await.clone();
        if let Err(e) = repository.save(&snapshot).await {
            warn!(session_id = %entry.id(), error = %e, "Failed to persist session");
        }
    }
}

/// Terminal event for a session that reached `status` without announcing it
fn terminal_event(status: SessionStatus, error: Option<&str>) -> SessionEvent {
    match status {
        SessionStatus::Completed => SessionEvent::Done,
        _ => SessionEvent::Error {
            code: "INTERNAL_ERROR".to_string(),
            message: error.unwrap_or("Session ended without a result").to_string(),
        },
    }
}

/// Outcome of a collaborator call bounded by a stage timeout
enum StageOutcome<T> {
    Done(T),
    Failed(CollaboratorError),
    TimedOut(PipelineError),
}

/// Run a collaborator call under the stage timeout
async fn call_stage<T, F>(stage: Stage, limit: Duration, call: F) -> StageOutcome<T>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => StageOutcome::Done(value),
        Ok(Err(e)) => StageOutcome::Failed(e),
        Err(_) => StageOutcome::TimedOut(PipelineError::StageTimeout { stage, limit }),
    }
}
