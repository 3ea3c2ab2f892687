use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::core::error::{ResolveError, Result};
use crate::core::extractor::MediaExtractor;
use crate::core::fetch::Fetcher;
use crate::core::media::ParseResult;
use crate::extractors::challenge::ChallengeSolver;
use crate::extractors::identifier::IdentifierResolver;
use crate::extractors::images::ImageLocator;
use crate::extractors::video::VideoLocator;

/// Turns a Douyin share link into watermark-free media URLs.
///
/// The video path is tried first. Any failure there, whatever its kind,
/// switches to the image path: resolve the aweme id, load the desktop page
/// through the challenge solver and collect its images. Only the image
/// path's error reaches the caller.
pub struct DouyinExtractor {
    video: VideoLocator,
    identifiers: IdentifierResolver,
    images: ImageLocator,
}

impl DouyinExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            video: VideoLocator::new(fetcher.clone()),
            identifiers: IdentifierResolver::new(fetcher.clone()),
            images: ImageLocator::new(ChallengeSolver::new(fetcher, config)),
        }
    }

    pub async fn resolve_media(&self, url: &str) -> Result<ParseResult> {
        match self.video.locate(url).await {
            Ok(play_url) => {
                info!("Resolved video for {}", url);
                return Ok(ParseResult::video(play_url));
            }
            Err(e) => warn!("Video path failed for {} ({}), trying images", url, e),
        }

        let urls = self.resolve_images(url).await?;
        info!("Resolved {} images for {}", urls.len(), url);
        ParseResult::images(urls)
            .ok_or_else(|| ResolveError::NotFound("no images found in page".to_string()))
    }

    async fn resolve_images(&self, url: &str) -> Result<Vec<String>> {
        let identifier = self.identifiers.resolve(url).await?;
        info!("Resolved {:?} {} for {}", identifier.kind, identifier.id, url);
        self.images.locate(&identifier.page_url()).await
    }
}

#[async_trait]
impl MediaExtractor for DouyinExtractor {
    fn name(&self) -> &'static str {
        "Douyin"
    }

    fn suitable(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                host == "douyin.com"
                    || host.ends_with(".douyin.com")
                    || host == "iesdouyin.com"
                    || host.ends_with(".iesdouyin.com")
            }
            None => false,
        }
    }

    async fn extract(&self, url: &Url) -> Result<ParseResult> {
        self.resolve_media(url.as_str()).await
    }
}
