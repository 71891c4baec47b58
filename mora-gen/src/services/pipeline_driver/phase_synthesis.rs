//! Phase 4: SYNTHESIZE
//!
//! Sequential per-segment code generation; load-bearing

use mora_common::events::{CodeSegment, Segment, SessionEvent, VideoTranscript};

use super::{call_stage, PipelineDriver, PipelineError, Stage, StageOutcome};
use crate::services::code_extract::{check_python_structure, extract_code_from_tags};
use crate::session_store::SessionEntry;

impl PipelineDriver {
    /// Phase 4: SYNTHESIZE - one call per segment, in plan order
    ///
    /// The first failing segment ends the session; segments already emitted
    /// stay in the log.
    pub(super) async fn phase_synthesis(
        &self,
        entry: &SessionEntry,
        transcript: &VideoTranscript,
        segments: &[Segment],
    ) -> Result<(), PipelineError> {
        let session_id = entry.id();
        let total = segments.len();
        let limit = self.config.synthesis_timeout();

        tracing::info!(session_id = %session_id, segments = total, "Phase 4: SYNTHESIZE");

        for (index, segment) in segments.iter().enumerate() {
            self.thought(
                entry,
                format!(
                    "Generating code for segment {}/{} ({}): {}",
                    index + 1,
                    total,
                    segment.time_range_label(),
                    segment.description
                ),
            );

            let slice = transcript.slice(segment.start_time, segment.end_time);
            let call = self.synthesizer.synthesize(segment, &slice);
            let raw = match call_stage(Stage::Synthesis, limit, call).await {
                StageOutcome::Done(raw) => raw,
                StageOutcome::Failed(e) => {
                    return Err(PipelineError::Synthesis {
                        segment: index + 1,
                        source: e,
                    })
                }
                StageOutcome::TimedOut(e) => return Err(e),
            };

            let code = extract_code_from_tags(&raw);
            let syntax_valid = match check_python_structure(&code) {
                Ok(()) => true,
                Err(issue) => {
                    tracing::warn!(
                        session_id = %session_id,
                        segment = index + 1,
                        error = %issue,
                        "Generated code failed the syntax check - keeping it"
                    );
                    false
                }
            };

            let code_segment = CodeSegment::from_segment(index, segment, code, syntax_valid);
            entry
                .session()
                .write()
                .await
                .push_code_segment(code_segment.clone())?;

            tracing::debug!(
                session_id = %session_id,
                segment = index + 1,
                lines = code_segment.code.lines().count(),
                syntax_valid,
                "Segment code generated"
            );

            self.emit(entry, SessionEvent::CodeSegment(code_segment));
        }

        self.persist(entry).await;
        self.emit(entry, SessionEvent::CodeDone);

        Ok(())
    }
}
