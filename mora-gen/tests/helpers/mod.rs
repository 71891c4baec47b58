//! Test helpers: scripted collaborators and fixtures
//!
//! Every mock counts its calls so tests can assert which collaborators the
//! pipeline touched.

#![allow(dead_code)]

use async_trait::async_trait;
use mora_common::events::{
    Segment, SessionEvent, Timeline, TimelineSegment, TranscriptEntry, VideoInfo, VideoTranscript,
};
use mora_gen::config::{PipelineConfig, StoreConfig};
use mora_gen::models::{Session, SessionStatus};
use mora_gen::services::{
    CodeSynthesizer, CollaboratorError, PipelineDriver, SegmentPlanner, SessionRepository,
    TimelineAssembler, TranscriptCache, TranscriptSource,
};
use mora_gen::session_store::SessionStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const BILIBILI_URL: &str = "https://www.bilibili.com/video/BV1xx411c7mD";
pub const YOUTUBE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// 90 second tutorial with four subtitle lines
pub fn sample_transcript(duration: f64) -> VideoTranscript {
    VideoTranscript {
        video: VideoInfo {
            title: "Python f-strings in 90 seconds".to_string(),
            author: Some("mora".to_string()),
            duration,
            cover: None,
        },
        entries: vec![
            TranscriptEntry::new(0.0, 20.0, "Today we look at f-strings"),
            TranscriptEntry::new(20.0, 40.0, "Put a variable in braces"),
            TranscriptEntry::new(40.0, 65.0, "Add a format spec after a colon"),
            TranscriptEntry::new(65.0, 90.0, "Width and precision work too"),
        ],
    }
}

pub fn two_segment_plan() -> Vec<Segment> {
    vec![
        Segment::new(0.0, 40.0, "Basic f-strings", "Print a greeting with an f-string"),
        Segment::new(40.0, 90.0, "Format specifiers", "Format a float with width and precision"),
    ]
}

pub fn sample_timeline() -> Timeline {
    Timeline {
        segments: vec![
            TimelineSegment {
                start_time: 0.0,
                end_time: 40.0,
                description: "Basic f-strings".to_string(),
                code_lines: "1-2".parse().ok(),
            },
            TimelineSegment {
                start_time: 40.0,
                end_time: 90.0,
                description: "Format specifiers".to_string(),
                code_lines: "4-5".parse().ok(),
            },
        ],
    }
}

/// Pipeline config with short stage limits
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        transcript_timeout_secs: 5,
        planning_timeout_secs: 5,
        synthesis_timeout_secs: 5,
        timeline_timeout_secs: 5,
        ..Default::default()
    }
}

pub fn test_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(&StoreConfig::default(), 64))
}

pub fn event_types(events: &[SessionEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}

/// Event types with narration filtered out
pub fn milestone_types(events: &[SessionEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter(|e| !matches!(e, SessionEvent::Thought { .. }))
        .map(|e| e.event_type())
        .collect()
}

// ============================================================================
// Transcript source
// ============================================================================

pub struct ScriptedSource {
    result: Result<VideoTranscript, CollaboratorError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn ok(transcript: VideoTranscript) -> Self {
        Self {
            result: Ok(transcript),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptSource for ScriptedSource {
    async fn fetch(&self, _video_url: &str) -> Result<VideoTranscript, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

// ============================================================================
// Segment planner
// ============================================================================

pub struct ScriptedPlanner {
    result: Result<Vec<Segment>, CollaboratorError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedPlanner {
    pub fn ok(segments: Vec<Segment>) -> Self {
        Self {
            result: Ok(segments),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SegmentPlanner for ScriptedPlanner {
    async fn plan(&self, _transcript: &VideoTranscript) -> Result<Vec<Segment>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

// ============================================================================
// Code synthesizer
// ============================================================================

/// Scripted reply for one synthesis call
#[derive(Debug, Clone)]
pub enum SynthStep {
    Reply(String),
    Fail(CollaboratorError),
    Hang(Duration),
    Panic,
}

/// Replays `steps` in call order; calls past the script get a tagged default
pub struct ScriptedSynthesizer {
    steps: Vec<SynthStep>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Segment, usize)>>,
}

impl ScriptedSynthesizer {
    pub fn new(steps: Vec<SynthStep>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Segments received, with the number of transcript entries passed along
    pub fn seen(&self) -> Vec<(Segment, usize)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeSynthesizer for ScriptedSynthesizer {
    async fn synthesize(
        &self,
        segment: &Segment,
        transcript: &[TranscriptEntry],
    ) -> Result<String, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((segment.clone(), transcript.len()));

        match self.steps.get(n).cloned() {
            Some(SynthStep::Reply(text)) => Ok(text),
            Some(SynthStep::Fail(e)) => Err(e),
            Some(SynthStep::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Ok("<code>late = True</code>".to_string())
            }
            Some(SynthStep::Panic) => panic!("synthesizer exploded"),
            None => Ok(format!("<code>segment_{} = True</code>", n + 1)),
        }
    }
}

// ============================================================================
// Timeline assembler
// ============================================================================

pub struct ScriptedAssembler {
    result: Result<Timeline, CollaboratorError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_code: Mutex<Option<String>>,
}

impl ScriptedAssembler {
    pub fn ok(timeline: Timeline) -> Self {
        Self {
            result: Ok(timeline),
            delay: None,
            calls: AtomicUsize::new(0),
            last_code: Mutex::new(None),
        }
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
            last_code: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_code(&self) -> Option<String> {
        self.last_code.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimelineAssembler for ScriptedAssembler {
    async fn assemble(
        &self,
        _transcript: &VideoTranscript,
        code: &str,
    ) -> Result<Timeline, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock().unwrap() = Some(code.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

// ============================================================================
// Cache and repository
// ============================================================================

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, VideoTranscript>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryCache {
    pub fn seeded(video_url: &str, transcript: VideoTranscript) -> Self {
        let cache = Self::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert(video_url.to_string(), transcript);
        cache
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, video_url: &str) -> bool {
        self.entries.lock().unwrap().contains_key(video_url)
    }
}

#[async_trait]
impl TranscriptCache for MemoryCache {
    async fn get(&self, video_url: &str) -> mora_common::Result<Option<VideoTranscript>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(video_url).cloned())
    }

    async fn put(&self, video_url: &str, transcript: &VideoTranscript) -> mora_common::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(video_url.to_string(), transcript.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    sessions: Mutex<HashMap<Uuid, Session>>,
    saves: AtomicUsize,
}

impl MemoryRepository {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: Uuid) -> Option<Session> {
        self.sessions.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn save(&self, session: &Session) -> mora_common::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id(), session.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> mora_common::Result<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(&id).cloned())
    }
}

/// Repository whose writes stall once the session reaches `status`
pub struct SlowRepository {
    inner: MemoryRepository,
    status: SessionStatus,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(status: SessionStatus, delay: Duration) -> Self {
        Self {
            inner: MemoryRepository::default(),
            status,
            delay,
        }
    }

    pub fn stored(&self, id: Uuid) -> Option<Session> {
        self.inner.stored(id)
    }
}

#[async_trait]
impl SessionRepository for SlowRepository {
    async fn save(&self, session: &Session) -> mora_common::Result<()> {
        if session.status() == self.status {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.save(session).await
    }

    async fn load(&self, id: Uuid) -> mora_common::Result<Option<Session>> {
        self.inner.load(id).await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Collaborators wired into one driver, kept around for call assertions
pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub planner: Arc<ScriptedPlanner>,
    pub synthesizer: Arc<ScriptedSynthesizer>,
    pub assembler: Arc<ScriptedAssembler>,
    pub config: PipelineConfig,
}

impl Harness {
    /// Happy-path collaborators for the 90 second sample video
    pub fn happy() -> Self {
        Self {
            source: Arc::new(ScriptedSource::ok(sample_transcript(90.0))),
            planner: Arc::new(ScriptedPlanner::ok(two_segment_plan())),
            synthesizer: Arc::new(ScriptedSynthesizer::always_ok()),
            assembler: Arc::new(ScriptedAssembler::ok(sample_timeline())),
            config: fast_config(),
        }
    }

    pub fn source(mut self, source: ScriptedSource) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn planner(mut self, planner: ScriptedPlanner) -> Self {
        self.planner = Arc::new(planner);
        self
    }

    pub fn synthesizer(mut self, synthesizer: ScriptedSynthesizer) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    pub fn assembler(mut self, assembler: ScriptedAssembler) -> Self {
        self.assembler = Arc::new(assembler);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn driver(&self) -> PipelineDriver {
        PipelineDriver::new(
            self.source.clone(),
            self.planner.clone(),
            self.synthesizer.clone(),
            self.assembler.clone(),
            self.config.clone(),
        )
    }
}
