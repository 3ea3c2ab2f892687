use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::core::error::{ResolveError, Result};
use crate::core::fetch::Fetcher;
use crate::core::media::{ContentIdentifier, ContentKind, Identity};
use crate::extractors::challenge::html_headers;

/// Tried in order; the first pattern that matches decides both id and kind.
static ID_PATTERNS: LazyLock<Vec<(Regex, ContentKind)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"/video/(\d+)").unwrap(), ContentKind::Video),
        (Regex::new(r"/note/(\d+)").unwrap(), ContentKind::Note),
        (Regex::new(r"/slides/(\d+)").unwrap(), ContentKind::Note),
        (Regex::new(r"/share/note/(\d+)").unwrap(), ContentKind::Note),
        (Regex::new(r"[?&]item_ids=(\d+)").unwrap(), ContentKind::Note),
        (Regex::new(r"[?&]aweme_ids=(\d+)").unwrap(), ContentKind::Note),
    ]
});

pub fn match_identifier(text: &str) -> Option<ContentIdentifier> {
    ID_PATTERNS.iter().find_map(|(re, kind)| {
        re.captures(text)
            .map(|captures| ContentIdentifier::new(&captures[1], *kind))
    })
}

/// Finds the aweme id behind a share link, spending at most one fetch.
pub struct IdentifierResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl IdentifierResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(&self, url: &str) -> Result<ContentIdentifier> {
        if let Some(id) = match_identifier(url) {
            debug!("Identifier {:?} taken from input URL", id);
            return Ok(id);
        }

        let page = self
            .fetcher
            .fetch(url, Identity::Mobile, html_headers())
            .await?;

        if let Some(id) = match_identifier(&page.final_url) {
            debug!("Identifier {:?} taken from redirect target {}", id, page.final_url);
            return Ok(id);
        }

        if let Some(id) = match_identifier(&page.body) {
            debug!("Identifier {:?} taken from page body", id);
            return Ok(id);
        }

        Err(ResolveError::NoIdentifierFound(url.to_string()))
    }
}
