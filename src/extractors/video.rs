use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::config::DOUYIN;
use crate::core::error::{ResolveError, Result};
use crate::core::fetch::Fetcher;
use crate::core::media::Identity;

static PLAY_ADDR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""video":\{"play_addr":\{"uri":"([a-z0-9]+)""#).unwrap());

pub fn extract_video_id(body: &str) -> Option<String> {
    PLAY_ADDR
        .captures(body)
        .map(|captures| captures[1].to_string())
}

pub fn play_url(video_id: &str) -> String {
    DOUYIN.play_url_template.replacen("%s", video_id, 1)
}

/// Reads the play address from the mobile share page, which is served
/// without the ACR challenge.
pub struct VideoLocator {
    fetcher: Arc<dyn Fetcher>,
}

impl VideoLocator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn locate(&self, url: &str) -> Result<String> {
        let page = self
            .fetcher
            .fetch(url, Identity::Mobile, HeaderMap::new())
            .await?;

        let video_id = extract_video_id(&page.body)
            .ok_or_else(|| ResolveError::NotFound("video id not found in page".to_string()))?;
        debug!("Found play address uri {}", video_id);

        Ok(play_url(&video_id))
    }
}
