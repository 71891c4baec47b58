//! Phase 5: TIMELINE and finalization

use mora_common::events::{SessionEvent, Timeline, VideoTranscript};

use super::{call_stage, PipelineDriver, PipelineError, Stage, StageOutcome};
use crate::models::SessionStatus;
use crate::session_store::SessionEntry;

impl PipelineDriver {
    /// Phase 5: TIMELINE - advisory, whole-video default on any failure
    pub(super) async fn phase_timeline(
        &self,
        entry: &SessionEntry,
        transcript: &VideoTranscript,
    ) -> Result<(), PipelineError> {
        let session_id = entry.id();

        tracing::info!(session_id = %session_id, "Phase 5: TIMELINE");
        self.thought(entry, "Aligning the code with the video timeline...");

        let code = entry.session().read().await.combined_code();
        let limit = self.config.timeline_timeout();

        let timeline = match call_stage(Stage::Timeline, limit, self.assembler.assemble(transcript, &code)).await {
            StageOutcome::Done(timeline) => timeline,
            StageOutcome::Failed(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Timeline assembly failed - using default");
                Timeline::whole_video(transcript.video.duration)
            }
            StageOutcome::TimedOut(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Timeline assembly timed out - using default");
                Timeline::whole_video(transcript.video.duration)
            }
        };

        entry.session().write().await.set_timeline(timeline.clone())?;
        self.emit(entry, SessionEvent::Timeline(timeline));

        Ok(())
    }

    /// Summary event, `completed` state with `done`, final write-through
    pub(super) async fn finalize(&self, entry: &SessionEntry) -> Result<(), PipelineError> {
        let segments = entry.session().read().await.code_segments().to_vec();

        self.emit(
            entry,
            SessionEvent::SegmentsComplete {
                total_segments: segments.len(),
                segments,
            },
        );

        {
            let mut session = entry.session().write().await;
            session.transition_to(SessionStatus::Completed)?;
            self.emit(entry, SessionEvent::Done);
        }

        self.settle(entry).await;

        Ok(())
    }
}
