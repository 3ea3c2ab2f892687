use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::core::error::{ResolveError, Result};
use crate::extractors::challenge::ChallengeSolver;
use crate::utils::decode_url_escapes;

static SIGNED_IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://p\d+(?:-[a-z]+)?-sign\.douyinpic\.com/[^\s"'<>\\]+"#).unwrap()
});
static QUALITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":q(\d+)").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Path prefix of genuine media assets; avatars and icons live elsewhere.
const CONTENT_PREFIX: &str = "tos-cn-i-";
const WATERMARK: &str = "watermark";
/// Separates the asset path from the rendition template.
const TEMPLATE_DELIMITER: char = '~';

const PREFERRED_HOST: &str = "p3-sign.douyinpic.com";
const PREFERRED_HOST_BONUS: i64 = 20;
const WATERMARK_PENALTY: i64 = -100_000;
const FULL_RESOLUTION_BONUS: i64 = 1_000;
const THUMBNAIL_PENALTY: i64 = -500;
const RESIZE_BONUS: i64 = 100;
const DIMENSION_BONUS_CAP: i64 = 20;
const MAX_QUALITY: i64 = 100;
const IMAGE_TYPE_BONUS: i64 = 500;
const IMAGE_BIZ_BONUS: i64 = 500;

const FULL_RESOLUTION_TEMPLATES: [&str; 3] = ["aweme-images", "tplv-dy-origin", "noop"];
const THUMBNAIL_TEMPLATES: [&str; 5] = ["shrink", "thumb", "cover", "lqen", "small"];

/// A signed CDN URL split into the pieces the scorer looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateParts {
    pub url: String,
    pub host: String,
    /// Asset path without the rendition, e.g. `tos-cn-i-0813/abc`.
    pub asset_path: String,
    /// Rendition template without the extension, e.g. `tplv-dy-aweme-images:q75`.
    pub template: String,
    pub format: String,
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub dedupe_key: String,
    pub url: String,
    pub score: i64,
}

pub fn parse_candidate(raw: &str) -> Option<CandidateParts> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_string();
    let path = url.path().trim_start_matches('/');

    let (asset_path, rendition) = match path.split_once(TEMPLATE_DELIMITER) {
        Some((asset, rendition)) => (asset, rendition),
        None => (path, ""),
    };
    if asset_path.is_empty() {
        return None;
    }

    let tail = if rendition.is_empty() { asset_path } else { rendition };
    let (template, format) = match tail.rsplit_once('.') {
        Some((template, format)) => (template, format.to_ascii_lowercase()),
        None => (tail, String::new()),
    };
    let template = if rendition.is_empty() { "" } else { template };

    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Some(CandidateParts {
        url: raw.to_string(),
        host,
        asset_path: asset_path.to_string(),
        template: template.to_string(),
        format,
        query,
    })
}

/// Higher is better. Pure, so the heuristic can be tuned and tested on its own.
pub fn score_candidate(parts: &CandidateParts) -> i64 {
    let mut score: i64 = 0;

    if parts.host == PREFERRED_HOST {
        score = score.saturating_add(PREFERRED_HOST_BONUS);
    }

    score = score.saturating_add(match parts.format.as_str() {
        "jpeg" | "jpg" => 30,
        "png" => 20,
        "webp" => 10,
        _ => 0,
    });

    if parts.template.contains(WATERMARK) || parts.url.contains(WATERMARK) {
        score = score.saturating_add(WATERMARK_PENALTY);
    }

    if FULL_RESOLUTION_TEMPLATES
        .iter()
        .any(|marker| parts.template.contains(marker))
    {
        score = score.saturating_add(FULL_RESOLUTION_BONUS);
    } else if THUMBNAIL_TEMPLATES
        .iter()
        .any(|marker| parts.template.contains(marker))
    {
        score = score.saturating_add(THUMBNAIL_PENALTY);
    }

    if parts.template.contains("resize") {
        score = score.saturating_add(RESIZE_BONUS);
    }

    // Digits come from the page; anything past the cap is noise, not quality.
    let quality = QUALITY.captures(&parts.template);
    if let Some(q) = quality.as_ref().map(|c| c[1].parse::<i64>().unwrap_or(MAX_QUALITY)) {
        score = score.saturating_add(q.min(MAX_QUALITY));
    }

    let quality_span = quality.and_then(|c| c.get(0)).map(|m| m.range());
    for number in NUMBER.find_iter(&parts.template) {
        if let Some(span) = &quality_span {
            if span.start <= number.start() && number.end() <= span.end {
                continue;
            }
        }
        let value = number.as_str().parse::<i64>().unwrap_or(i64::MAX);
        score = score.saturating_add((value / 100).min(DIMENSION_BONUS_CAP));
    }

    for (key, value) in &parts.query {
        match key.as_str() {
            "sc" if value == "image" => score = score.saturating_add(IMAGE_TYPE_BONUS),
            "biz_tag" if value == "aweme_images" => {
                score = score.saturating_add(IMAGE_BIZ_BONUS)
            }
            _ => {}
        }
    }

    score
}

/// Every signed, watermark-free asset URL in `body`, one per asset, in
/// first-seen order. The best-scoring rendition of each asset wins; ties keep
/// the earlier URL.
pub fn extract_image_urls(body: &str) -> Vec<String> {
    let normalized = decode_url_escapes(body);
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, ImageCandidate> = HashMap::new();
    let mut seen = 0usize;

    for found in SIGNED_IMAGE_URL.find_iter(&normalized) {
        let raw = found.as_str();
        seen += 1;
        if raw.contains(WATERMARK) || !raw.contains(CONTENT_PREFIX) {
            continue;
        }
        let Some(parts) = parse_candidate(raw) else {
            continue;
        };

        let candidate = ImageCandidate {
            dedupe_key: parts.asset_path.clone(),
            score: score_candidate(&parts),
            url: parts.url,
        };

        match best.get(&candidate.dedupe_key) {
            None => {
                order.push(candidate.dedupe_key.clone());
                best.insert(candidate.dedupe_key.clone(), candidate);
            }
            Some(previous) if candidate.score > previous.score => {
                best.insert(candidate.dedupe_key.clone(), candidate);
            }
            Some(_) => {}
        }
    }

    debug!("{} signed URLs matched, {} distinct assets", seen, order.len());

    order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .map(|candidate| candidate.url)
        .collect()
}

/// Pulls the image set out of a challenge-free desktop page.
pub struct ImageLocator {
    solver: ChallengeSolver,
}

impl ImageLocator {
    pub fn new(solver: ChallengeSolver) -> Self {
        Self { solver }
    }

    pub async fn locate(&self, url: &str) -> Result<Vec<String>> {
        let body = self.solver.fetch_page(url).await?;
        let urls = extract_image_urls(&body);
        if urls.is_empty() {
            return Err(ResolveError::NotFound("no images found in page".to_string()));
        }
        Ok(urls)
    }
}
