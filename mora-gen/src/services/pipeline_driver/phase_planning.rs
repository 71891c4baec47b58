//! Phase 3: PLAN
//!
//! Segment planning; advisory

use mora_common::events::{Segment, SessionEvent, VideoTranscript};

use super::{call_stage, PipelineDriver, PipelineError, Stage, StageOutcome};
use crate::session_store::SessionEntry;

impl PipelineDriver {
    /// Phase 3: PLAN - normalized plan of at most `max_segments`, whole-video fallback
    pub(super) async fn phase_planning(
        &self,
        entry: &SessionEntry,
        transcript: &VideoTranscript,
    ) -> Result<Vec<Segment>, PipelineError> {
        let session_id = entry.id();
        let duration = transcript.video.duration;
        let max_segments = self.config.max_segments.max(1);

        tracing::info!(session_id = %session_id, "Phase 3: PLAN");
        self.thought(entry, "Analyzing the transcript and planning code segments...");

        let limit = self.config.planning_timeout();
        let planned = match call_stage(Stage::Planning, limit, self.planner.plan(transcript)).await {
            StageOutcome::Done(segments) if !segments.is_empty() => Some(segments),
            StageOutcome::Done(_) => {
                tracing::warn!(session_id = %session_id, "Planner returned no segments - using whole video");
                None
            }
            StageOutcome::Failed(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Segment planning failed - using whole video");
                None
            }
            StageOutcome::TimedOut(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Segment planning timed out - using whole video");
                None
            }
        };

        let segments = match planned {
            Some(raw) => {
                let planned_count = raw.len();
                let segments = normalize_plan(raw.clone(), duration, max_segments);
                if segments != raw {
                    tracing::warn!(
                        session_id = %session_id,
                        planned = planned_count,
                        kept = segments.len(),
                        max_segments,
                        "Planner output reordered, clamped or truncated"
                    );
                }
                segments
            }
            None => vec![Segment::whole_video(duration)],
        };

        entry.session().write().await.set_segments(segments.clone())?;
        self.persist(entry).await;

        for (i, segment) in segments.iter().enumerate() {
            tracing::info!(
                session_id = %session_id,
                segment = i + 1,
                time_range = %segment.time_range_label(),
                description = %segment.description,
                "Segment planned"
            );
        }

        self.emit(
            entry,
            SessionEvent::Plan {
                segments: segments.clone(),
            },
        );
        self.thought(
            entry,
            format!("Planned {} code segment(s)", segments.len()),
        );

        Ok(segments)
    }
}

/// Turn planner output into an ordered, non-overlapping plan within `[0, duration]`
///
/// Segments with non-finite or empty ranges are dropped, the rest are clamped
/// to the video and sorted by start time. A segment overlapping its
/// predecessor starts where the predecessor ends, and is dropped if nothing
/// remains. At most `max_segments` are kept; an empty result becomes the
/// whole-video segment.
pub(super) fn normalize_plan(segments: Vec<Segment>, duration: f64, max_segments: usize) -> Vec<Segment> {
    let mut clamped: Vec<Segment> = segments
        .into_iter()
        .filter(|s| s.start_time.is_finite() && s.end_time.is_finite())
        .map(|mut s| {
            s.start_time = s.start_time.max(0.0);
            s.end_time = s.end_time.min(duration);
            s
        })
        .filter(|s| s.end_time > s.start_time)
        .collect();
    clamped.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut plan: Vec<Segment> = Vec::with_capacity(clamped.len());
    for mut segment in clamped {
        if let Some(previous) = plan.last() {
            if segment.start_time < previous.end_time {
                segment.start_time = previous.end_time;
            }
            if segment.end_time <= segment.start_time {
                continue;
            }
        }
        plan.push(segment);
    }

    plan.truncate(max_segments.max(1));
    if plan.is_empty() {
        plan.push(Segment::whole_video(duration));
    }
    plan
}
