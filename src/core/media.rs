use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DOUYIN;

/// Which browser a request pretends to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Desktop,
    Mobile,
}

impl Identity {
    pub fn user_agent(&self) -> &'static str {
        match self {
            Identity::Desktop => DOUYIN.desktop_user_agent,
            Identity::Mobile => DOUYIN.mobile_user_agent,
        }
    }
}

/// Outcome of one GET, after redirects. HTTP status is deliberately not kept:
/// only the body and headers matter downstream.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub final_url: String,
    pub body: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Note,
}

/// Canonical aweme id plus the kind of page it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdentifier {
    pub id: String,
    pub kind: ContentKind,
}

impl ContentIdentifier {
    pub fn new(id: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Desktop page that carries the full media payload for this id.
    pub fn page_url(&self) -> String {
        let template = match self.kind {
            ContentKind::Video => DOUYIN.video_page_template,
            ContentKind::Note => DOUYIN.note_page_template,
        };
        template.replacen("%s", &self.id, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Images,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Images => write!(f, "images"),
        }
    }
}

/// Final answer of a resolution: one playback URL, or a non-empty ordered
/// list of image URLs. Fields are private so neither invariant can be broken
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    #[serde(rename = "type")]
    kind: MediaKind,
    urls: Vec<String>,
}

impl ParseResult {
    pub fn video(url: String) -> Self {
        Self {
            kind: MediaKind::Video,
            urls: vec![url],
        }
    }

    /// Returns `None` for an empty list; an empty image set is a failure, not a result.
    pub fn images(urls: Vec<String>) -> Option<Self> {
        if urls.is_empty() {
            return None;
        }
        Some(Self {
            kind: MediaKind::Images,
            urls,
        })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}
