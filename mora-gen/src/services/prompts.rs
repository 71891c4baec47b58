//! Prompt construction for the LLM-backed collaborators

use mora_common::events::{format_clock, Segment, TranscriptEntry, VideoTranscript};

/// Transcript lines shown to the code synthesizer per segment
pub const MAX_SEGMENT_LINES: usize = 30;

/// Code characters shown to the timeline assembler
pub const MAX_TIMELINE_CODE_CHARS: usize = 3000;

/// Keep one transcript line in this many for the timeline prompt
pub const TIMELINE_SAMPLE_STRIDE: usize = 10;

pub const PLANNER_SYSTEM: &str =
    "You are a video content analyst. You read programming tutorial transcripts and produce structured outlines in JSON.";

pub const SYNTHESIZER_SYSTEM: &str =
    "You are a professional Python code generator. You write clean, runnable, segment-specific demonstration code.";

pub const TIMELINE_SYSTEM: &str =
    "You are a JSON data expert. You map video time ranges to line ranges of generated code.";

fn transcript_lines(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("[{:.1}s] {}", entry.start, entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Planner prompt: split the whole transcript into at most `max_segments` parts
pub fn planning_prompt(transcript: &VideoTranscript, max_segments: usize) -> String {
    format!(
        r#"Read the transcript of this Python tutorial video and outline its structure.

Video title: {title}
Duration: {duration} seconds

Transcript:
{lines}

Split the video into 1 to {max} logical segments (never more than {max}). Each segment covers one complete concept.
For each segment provide:
- startTime: segment start in seconds
- endTime: segment end in seconds
- description: what the presenter covers (one short sentence)
- task: what code should be written to demonstrate it

Output format:
{{
  "segments": [
    {{"startTime": 0, "endTime": 60, "description": "Course introduction", "task": "Comment block stating the learning goals"}},
    {{"startTime": 60, "endTime": 180, "description": "f-string syntax", "task": "Demonstrate f-string interpolation of variables"}}
  ]
}}

Rules: segments in chronological order without overlap; output only JSON."#,
        title = transcript.video.title,
        duration = transcript.video.duration,
        lines = transcript_lines(&transcript.entries),
        max = max_segments,
    )
}

/// Synthesizer prompt for one segment and its transcript slice
pub fn synthesis_prompt(segment: &Segment, entries: &[TranscriptEntry]) -> String {
    let shown = &entries[..entries.len().min(MAX_SEGMENT_LINES)];
    format!(
        r#"Write the demonstration code for one part of a Python tutorial video.

Time range: {start} - {end}
Summary: {description}
Code task: {task}

Transcript of this part:
{lines}

Requirements:
1. Runnable Python that demonstrates "{description}"
2. Fulfils the code task "{task}"
3. Correct syntax, 4-space indentation, clear comments
4. Do not copy the transcript into the code

Output format (strict):
<code>
# Video {start}-{end} - {description}

# demonstration code here
</code>"#,
        start = format_clock(segment.start_time),
        end = format_clock(segment.end_time),
        description = segment.description,
        task = segment.task,
        lines = transcript_lines(shown),
    )
}

/// Timeline prompt over the sampled transcript and the combined code
pub fn timeline_prompt(transcript: &VideoTranscript, code: &str) -> String {
    let sampled: Vec<TranscriptEntry> = transcript
        .entries
        .iter()
        .step_by(TIMELINE_SAMPLE_STRIDE)
        .cloned()
        .collect();

    let total_lines = code.lines().count();
    let shown_code: String = code.chars().take(MAX_TIMELINE_CODE_CHARS).collect();

    let markers: Vec<String> = code
        .lines()
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with("# Video"))
        .map(|(i, line)| format!("Line {}: {}", i + 1, line.trim()))
        .collect();
    let markers = if markers.is_empty() {
        "No explicit time comments found".to_string()
    } else {
        markers.join("\n")
    };

    format!(
        r##"Map the video timeline onto the generated code.

Video duration: {duration} seconds

Transcript (sampled):
{lines}

Generated code ({total_lines} lines total):
```python
{shown_code}
```

Time comments in code:
{markers}

Output format:
{{
  "segments": [
    {{"startTime": 0, "endTime": 30, "description": "Introduction", "codeLines": null}},
    {{"startTime": 30, "endTime": 120, "description": "String basics", "codeLines": "5-15"}}
  ]
}}

Rules: codeLines is "start-end" (1-based, inclusive) or null; segments in chronological order without overlap; prefer the "# Video m:ss" comments for alignment; output only JSON."##,
        duration = transcript.video.duration,
        lines = transcript_lines(&sampled),
    )
}
