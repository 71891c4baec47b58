//! Supported video platform detection
//!
//! A URL is accepted when it points at YouTube, Bilibili or TikTok. The
//! scheme and `www.` prefix are optional and matching is case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+").expect("valid regex")
});

static BILIBILI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?bilibili\.com/(video|bangumi)/.+").expect("valid regex")
});

static TIKTOK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://)?(www\.)?(tiktok\.com|vm\.tiktok\.com)/.+").expect("valid regex")
});

/// Video hosting platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Bilibili,
    TikTok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Bilibili => "bilibili",
            Platform::TikTok => "tiktok",
        }
    }
}

/// Identify the platform a URL belongs to
pub fn detect_platform(url: &str) -> Option<Platform> {
    if YOUTUBE.is_match(url) {
        Some(Platform::YouTube)
    } else if BILIBILI.is_match(url) {
        Some(Platform::Bilibili)
    } else if TIKTOK.is_match(url) {
        Some(Platform::TikTok)
    } else {
        None
    }
}

/// Whether a declared duration is acceptable: `0 < duration <= max`
pub fn is_valid_duration(duration: f64, max_duration: f64) -> bool {
    duration.is_finite() && duration > 0.0 && duration <= max_duration
}
