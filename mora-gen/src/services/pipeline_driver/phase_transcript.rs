//! Phase 2: TRANSCRIPT
//!
//! Cache lookup, transcript fetch and duration ceiling

use mora_common::events::{SessionEvent, VideoTranscript};

use super::{call_stage, PipelineDriver, PipelineError, Stage, StageOutcome};
use crate::services::video_url::is_valid_duration;
use crate::session_store::SessionEntry;

impl PipelineDriver {
    /// Phase 2: TRANSCRIPT - load-bearing
    pub(super) async fn phase_transcript(
        &self,
        entry: &SessionEntry,
    ) -> Result<VideoTranscript, PipelineError> {
        let session_id = entry.id();
        let video_url = entry.session().read().await.video_url().to_string();

        tracing::info!(session_id = %session_id, "Phase 2: TRANSCRIPT");
        self.thought(entry, "Fetching the video transcript...");

        let (transcript, from_cache) = match self.cached_transcript(entry, &video_url).await {
            Some(transcript) => (transcript, true),
            None => {
                let limit = self.config.transcript_timeout();
                let fetch = self.transcript_source.fetch(&video_url);
                match call_stage(Stage::Transcript, limit, fetch).await {
                    StageOutcome::Done(transcript) => (transcript, false),
                    StageOutcome::Failed(e) => return Err(PipelineError::TranscriptFetch(e)),
                    StageOutcome::TimedOut(e) => return Err(e),
                }
            }
        };

        let duration = transcript.video.duration;
        let max = self.config.max_video_duration_secs;
        if !is_valid_duration(duration, max) {
            return Err(if duration > max {
                PipelineError::VideoTooLong { duration, max }
            } else {
                PipelineError::InvalidDuration(duration)
            });
        }

        if transcript.entries.is_empty() {
            return Err(PipelineError::NoTranscript);
        }

        // Only transcripts that passed every check are cached
        if !from_cache {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.put(&video_url, &transcript).await {
                    tracing::warn!(session_id = %session_id, error = %e, "Failed to cache transcript");
                }
            }
        }

        entry
            .session()
            .write()
            .await
            .set_transcript(transcript.video.clone(), transcript.entries.clone())?;
        self.persist(entry).await;

        tracing::info!(
            session_id = %session_id,
            title = %transcript.video.title,
            duration,
            entries = transcript.entries.len(),
            from_cache,
            "Transcript loaded"
        );

        self.emit(entry, SessionEvent::Video(transcript.video.clone()));
        self.thought(
            entry,
            format!(
                "Loaded {} transcript lines for \"{}\"",
                transcript.entries.len(),
                transcript.video.title
            ),
        );

        Ok(transcript)
    }

    /// Cache lookup; any cache failure counts as a miss
    async fn cached_transcript(
        &self,
        entry: &SessionEntry,
        video_url: &str,
    ) -> Option<VideoTranscript> {
        let cache = self.cache.as_ref()?;
        match cache.get(video_url).await {
            Ok(Some(transcript)) => {
                tracing::info!(session_id = %entry.id(), "Transcript cache hit");
                Some(transcript)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    session_id = %entry.id(),
                    error = %e,
                    "Transcript cache lookup failed - fetching"
                );
                None
            }
        }
    }
}
