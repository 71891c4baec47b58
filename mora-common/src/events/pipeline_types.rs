//! Pipeline payload type definitions
//!
//! Supporting types shared by the session model, the collaborator boundaries
//! and the SSE event payloads. JSON field names are camelCase to match what
//! the web client consumes.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One subtitle line of a video transcript (times in seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "startTime", alias = "start")]
    pub start: f64,
    #[serde(rename = "endTime", alias = "end")]
    pub end: f64,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether this entry overlaps the half-open window `[start, end)`
    ///
    /// Zero-length entries count when their start falls inside the window.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        if self.end <= self.start {
            return self.start >= start && self.start < end;
        }
        self.start < end && self.end > start
    }
}

/// Video metadata, known once the transcript has been fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Declared duration in seconds
    pub duration: f64,
    /// Cover / thumbnail URL
    #[serde(default, alias = "thumbnail")]
    pub cover: Option<String>,
}

/// Everything a transcript source returns for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTranscript {
    pub video: VideoInfo,
    pub entries: Vec<TranscriptEntry>,
}

impl VideoTranscript {
    /// Entries overlapping `[start, end)`, in original order
    pub fn slice(&self, start: f64, end: f64) -> Vec<TranscriptEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.overlaps(start, end))
            .cloned()
            .collect()
    }
}

/// A planned content segment of the video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_time: f64,
    pub end_time: f64,
    /// What the presenter covers in this range
    #[serde(alias = "summary")]
    pub description: String,
    /// What code should be written for this range
    #[serde(default, alias = "codeTask")]
    pub task: String,
}

impl Segment {
    pub fn new(
        start_time: f64,
        end_time: f64,
        description: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            start_time,
            end_time,
            description: description.into(),
            task: task.into(),
        }
    }

    /// Single segment covering the whole video, used when planning yields nothing
    pub fn whole_video(duration: f64) -> Self {
        Self::new(
            0.0,
            duration,
            "Complete tutorial content",
            "Generate demonstration code for the whole video",
        )
    }

    /// Human-readable `m:ss-m:ss` label
    pub fn time_range_label(&self) -> String {
        format!(
            "{}-{}",
            format_clock(self.start_time),
            format_clock(self.end_time)
        )
    }
}

/// Synthesized code for one planned segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSegment {
    /// 0-based position in the plan
    pub segment_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub description: String,
    #[serde(default)]
    pub task: String,
    pub code: String,
    pub time_range: String,
    /// Result of the structural syntax check; invalid code is still kept
    #[serde(default = "default_true")]
    pub syntax_valid: bool,
}

fn default_true() -> bool {
    true
}

impl CodeSegment {
    pub fn from_segment(index: usize, segment: &Segment, code: String, syntax_valid: bool) -> Self {
        Self {
            segment_index: index,
            start_time: segment.start_time,
            end_time: segment.end_time,
            description: segment.description.clone(),
            task: segment.task.clone(),
            code,
            time_range: segment.time_range_label(),
            syntax_valid,
        }
    }
}

/// Inclusive 1-based range of code lines, serialized as `"start-end"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s, s),
        };
        let start: u32 = start
            .parse()
            .map_err(|_| format!("invalid line range: {s:?}"))?;
        let end: u32 = end
            .parse()
            .map_err(|_| format!("invalid line range: {s:?}"))?;
        if start == 0 || end < start {
            return Err(format!("invalid line range: {s:?}"));
        }
        Ok(Self { start, end })
    }
}

impl Serialize for LineRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// One entry of the final time → code mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSegment {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub description: String,
    /// `None` when the range has no associated code
    #[serde(default)]
    pub code_lines: Option<LineRange>,
}

/// Mapping from video time ranges to generated-code line ranges
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<TimelineSegment>,
}

impl Timeline {
    /// Default timeline used when assembly fails
    pub fn whole_video(duration: f64) -> Self {
        Self {
            segments: vec![TimelineSegment {
                start_time: 0.0,
                end_time: duration,
                description: "Complete video content".to_string(),
                code_lines: None,
            }],
        }
    }
}

/// Format seconds as `m:ss`
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
