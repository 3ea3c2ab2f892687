use async_trait::async_trait;
use reqwest::header::{HeaderMap, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::core::error::Result;
use crate::core::media::{FetchResult, Identity};

/// The one network capability the pipeline needs: a redirect-following GET.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        identity: Identity,
        extra_headers: HeaderMap,
    ) -> Result<FetchResult>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .redirect(reqwest::redirect::Policy::limited(config.redirect_limit))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        identity: Identity,
        extra_headers: HeaderMap,
    ) -> Result<FetchResult> {
        debug!("GET {} as {:?}", url, identity);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, identity.user_agent())
            .headers(extra_headers)
            .send()
            .await?;

        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        debug!("Fetched {} (status {})", final_url, response.status());
        let body = response.text().await?;

        Ok(FetchResult {
            final_url,
            body,
            headers,
        })
    }
}
