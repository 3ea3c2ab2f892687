#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use douyin_nowm::core::error::{ResolveError, Result};
use douyin_nowm::core::{FetchResult, Fetcher, Identity};

#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub identity: Identity,
    pub headers: HeaderMap,
}

/// Serves scripted responses per (url, identity), in order, and records
/// every request. Unscripted requests fail like a dead network.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<(String, Identity), VecDeque<Option<FetchResult>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, identity: Identity, page: FetchResult) {
        self.push(url, identity, Some(page));
    }

    pub fn fail(&self, url: &str, identity: Identity) {
        self.push(url, identity, None);
    }

    fn push(&self, url: &str, identity: Identity, response: Option<FetchResult>) {
        self.responses
            .lock()
            .unwrap()
            .entry((url.to_string(), identity))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, identity: Identity) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.identity == identity)
            .count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, identity: Identity, extra_headers: HeaderMap) -> Result<FetchResult> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            identity,
            headers: extra_headers,
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&(url.to_string(), identity))
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Some(page)) => Ok(page),
            _ => Err(ResolveError::Transport(format!("connection refused: {}", url))),
        }
    }
}

pub fn page(final_url: &str, body: &str) -> FetchResult {
    FetchResult {
        final_url: final_url.to_string(),
        body: body.to_string(),
        headers: HeaderMap::new(),
    }
}

pub fn page_with_cookie(final_url: &str, body: &str, set_cookie: &str) -> FetchResult {
    let mut result = page(final_url, body);
    result
        .headers
        .insert(SET_COOKIE, HeaderValue::from_str(set_cookie).unwrap());
    result
}

/// A challenge page in the shape the site serves: the verification script
/// in the first block, followed by the `_f1` bootstrap block.
pub fn challenge_page(script: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><script>{}</script><script>function _f1(){{window.byted_acrawler.init();}}</script></head><body></body></html>",
        script
    )
}

pub const SIGNING_SCRIPT: &str = r#"
    window.byted_acrawler = {
        init: function (opts) { this.aid = opts.aid; },
        sign: function (payload, nonce) {
            return "sig" + this.aid + nonce + location.href.length;
        }
    };
"#;

pub fn image_page(urls: &[&str]) -> String {
    let list = urls
        .iter()
        .map(|url| format!("\"{}\"", url.replace('/', "\\u002F").replace('&', "\\u0026")))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "<html><script id=\"RENDER_DATA\">{{\"images\":[{{\"url_list\":[{}]}}]}}</script></html>",
        list
    )
}
