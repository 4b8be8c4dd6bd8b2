//! YouTube link handling for project and news videos.
//!
//! Nothing here fails: input that is not a YouTube link comes back
//! unchanged (or as `None`), so Vimeo and other hosts pass straight through.

use crate::error::SiteError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EMBED_PREFIX: &str = "https://www.youtube.com/embed/";
const THUMBNAIL_HOST: &str = "https://img.youtube.com/vi";

/// Shortest extracted id accepted by [`is_valid_youtube_url`].
pub const MIN_VIDEO_ID_LEN: usize = 10;

/// Tried in order; the first pattern that matches decides the id.
static PATTERNS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        // watch?v=ID on the desktop host, with v anywhere in the query
        Regex::new(r"(?:^|//)(?:www\.)?youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"m\.youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]+)").unwrap(),
    ]
});

static EMBED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube(?:-nocookie)?\.com/embed/[A-Za-z0-9_-]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    Default,
    Medium,
    #[default]
    High,
    Standard,
    Maxres,
}

impl ThumbnailQuality {
    pub const ALL: [ThumbnailQuality; 5] = [
        ThumbnailQuality::Default,
        ThumbnailQuality::Medium,
        ThumbnailQuality::High,
        ThumbnailQuality::Standard,
        ThumbnailQuality::Maxres,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default.jpg",
            ThumbnailQuality::Medium => "mqdefault.jpg",
            ThumbnailQuality::High => "hqdefault.jpg",
            ThumbnailQuality::Standard => "sddefault.jpg",
            ThumbnailQuality::Maxres => "maxresdefault.jpg",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "medium",
            ThumbnailQuality::High => "high",
            ThumbnailQuality::Standard => "standard",
            ThumbnailQuality::Maxres => "maxres",
        }
    }
}

impl fmt::Display for ThumbnailQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThumbnailQuality {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThumbnailQuality::ALL
            .iter()
            .copied()
            .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SiteError::ValidationError(format!(
                    "Unknown thumbnail quality '{}', expected one of default, medium, high, standard, maxres",
                    s
                ))
            })
    }
}

/// Pulls the video id out of a watch, short, embed or mobile link.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Embeddable form of a YouTube link. Embed links and non-YouTube input are
/// returned as given.
pub fn to_embed_url(url: &str) -> String {
    if url.is_empty() || EMBED_URL.is_match(url) {
        return url.to_string();
    }

    match extract_video_id(url) {
        Some(id) => format!("{}{}", EMBED_PREFIX, id),
        None => url.to_string(),
    }
}

pub fn thumbnail_url(url: &str, quality: ThumbnailQuality) -> Option<String> {
    extract_video_id(url).map(|id| thumbnail_for_id(&id, quality))
}

pub fn thumbnail_for_id(video_id: &str, quality: ThumbnailQuality) -> String {
    format!("{}/{}/{}", THUMBNAIL_HOST, video_id, quality.file_name())
}

/// Loose check: an id was found and it is at least [`MIN_VIDEO_ID_LEN`] long.
/// Real ids are exactly 11 characters; the looser bound is kept on purpose
/// so links already stored in the database keep validating.
pub fn is_valid_youtube_url(url: &str) -> bool {
    extract_video_id(url)
        .map(|id| id.len() >= MIN_VIDEO_ID_LEN)
        .unwrap_or(false)
}
