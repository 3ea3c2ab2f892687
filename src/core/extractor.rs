use crate::core::error::{ResolveError, Result};
use crate::core::media::ParseResult;
use async_trait::async_trait;
use url::Url;

#[async_trait]
pub trait MediaExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn suitable(&self, url: &Url) -> bool;
    async fn extract(&self, url: &Url) -> Result<ParseResult>;
}

pub struct ExtractorEngine {
    pub extractors: Vec<Box<dyn MediaExtractor>>,
}

impl ExtractorEngine {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    pub fn register_extractor(&mut self, extractor: Box<dyn MediaExtractor>) {
        self.extractors.push(extractor);
    }

    pub async fn extract(&self, url: &str) -> Result<ParseResult> {
        let parsed_url = Url::parse(url.trim())?;

        for extractor in &self.extractors {
            if extractor.suitable(&parsed_url) {
                tracing::debug!("Using {} extractor for {}", extractor.name(), parsed_url);
                return extractor.extract(&parsed_url).await;
            }
        }

        Err(ResolveError::Unsupported(url.to_string()))
    }
}

impl Default for ExtractorEngine {
    fn default() -> Self {
        Self::new()
    }
}
