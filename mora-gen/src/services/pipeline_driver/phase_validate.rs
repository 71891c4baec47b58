//! Phase 1: VALIDATE
//!
//! Supported-platform check; no collaborator is called

use super::{PipelineDriver, PipelineError};
use crate::models::SessionStatus;
use crate::services::video_url::detect_platform;
use crate::session_store::SessionEntry;

impl PipelineDriver {
    /// Phase 1: VALIDATE - reject unsupported URLs, then start processing
    pub(super) async fn phase_validate(&self, entry: &SessionEntry) -> Result<(), PipelineError> {
        let video_url = entry.session().read().await.video_url().to_string();

        let Some(platform) = detect_platform(&video_url) else {
            tracing::warn!(
                session_id = %entry.id(),
                video_url = %video_url,
                "Unsupported video URL"
            );
            return Err(PipelineError::InvalidVideoUrl(video_url));
        };

        entry
            .session()
            .write()
            .await
            .transition_to(SessionStatus::Processing)?;

        tracing::info!(
            session_id = %entry.id(),
            platform = platform.as_str(),
            "Phase 1: VALIDATE passed"
        );

        Ok(())
    }
}
