//! Transcript source: video URL → metadata + timed subtitle entries
//!
//! [`BibiGptClient`] talks to the BibiGPT subtitle API
//! (`GET {api_url}/getSubtitle?url=…&enabledSpeaker=true`).

use async_trait::async_trait;
use mora_common::events::{TranscriptEntry, VideoInfo, VideoTranscript};
use serde::Deserialize;
use std::time::Duration;

use super::CollaboratorError;
use crate::config::TranscriptConfig;

const USER_AGENT: &str = concat!("mora-gen/", env!("CARGO_PKG_VERSION"));

/// Fetches the transcript of a video
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_url: &str) -> Result<VideoTranscript, CollaboratorError>;
}

/// BibiGPT subtitle response envelope
#[derive(Debug, Deserialize)]
struct SubtitleResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    detail: Option<SubtitleDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubtitleDetail {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    subtitles_array: Vec<SubtitleLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubtitleLine {
    #[serde(default)]
    start_time: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

impl From<SubtitleDetail> for VideoTranscript {
    fn from(detail: SubtitleDetail) -> Self {
        VideoTranscript {
            video: VideoInfo {
                title: detail.title.unwrap_or_else(|| "Unknown".to_string()),
                author: detail.author,
                duration: detail.duration.unwrap_or(0.0),
                cover: detail.cover,
            },
            entries: detail
                .subtitles_array
                .into_iter()
                .map(|line| TranscriptEntry::new(line.start_time, line.end, line.text))
                .collect(),
        }
    }
}

/// BibiGPT API client
pub struct BibiGptClient {
    http_client: reqwest::Client,
    config: TranscriptConfig,
}

impl BibiGptClient {
    pub fn new(config: TranscriptConfig) -> Result<Self, CollaboratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl TranscriptSource for BibiGptClient {
    async fn fetch(&self, video_url: &str) -> Result<VideoTranscript, CollaboratorError> {
        let url = format!("{}/getSubtitle", self.config.api_url.trim_end_matches('/'));

        tracing::debug!(video_url, "Querying subtitle API");

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("url", video_url), ("enabledSpeaker", "true")]);
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body: SubtitleResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(e.to_string()))?;

        if !body.success {
            return Err(CollaboratorError::Rejected(
                "Failed to extract subtitle from video".to_string(),
            ));
        }

        let detail = body
            .detail
            .ok_or_else(|| CollaboratorError::EmptyResponse("subtitle API".to_string()))?;

        let transcript = VideoTranscript::from(detail);

        tracing::info!(
            title = %transcript.video.title,
            duration = transcript.video.duration,
            entries = transcript.entries.len(),
            "Subtitle fetch successful"
        );

        Ok(transcript)
    }
}
