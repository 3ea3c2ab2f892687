use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed facts about the site. These are part of the extraction protocol, not
/// tuning knobs, so they live in a constant table instead of `Config`.
#[derive(Debug)]
pub struct SiteProfile {
    pub desktop_user_agent: &'static str,
    pub mobile_user_agent: &'static str,
    pub accept_html: &'static str,
    pub play_url_template: &'static str,
    pub video_page_template: &'static str,
    pub note_page_template: &'static str,
    pub challenge_referer: &'static str,
    pub nonce_cookie: &'static str,
    pub signature_cookie: &'static str,
    pub referer_cookie: &'static str,
    pub challenge_marker: &'static str,
    pub crawler_object: &'static str,
    pub script_end_marker: &'static str,
}

pub const DOUYIN: SiteProfile = SiteProfile {
    desktop_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    mobile_user_agent: "Mozilla/5.0 (Linux; Android 11; SAMSUNG SM-G973U) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/14.2 Chrome/87.0.4280.141 Mobile Safari/537.36",
    accept_html: "text/html",
    play_url_template: "https://www.iesdouyin.com/aweme/v1/play/?video_id=%s&ratio=1080p&line=0",
    video_page_template: "https://www.douyin.com/video/%s",
    note_page_template: "https://www.douyin.com/note/%s",
    challenge_referer: "https://www.douyin.com/",
    nonce_cookie: "__ac_nonce",
    signature_cookie: "__ac_signature",
    referer_cookie: "__ac_referer=__ac_blank",
    challenge_marker: "window.byted_acrawler",
    crawler_object: "byted_acrawler",
    script_end_marker: "<script>function _f1",
};

/// Transport and sandbox tuning. Everything here has a working default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whole-request timeout in seconds.
    pub timeout: u64,
    pub redirect_limit: usize,
    /// Wall-clock budget for one challenge script, in milliseconds.
    pub script_timeout_ms: u64,
    pub script_memory_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: 30,
            redirect_limit: 10,
            script_timeout_ms: 5_000,
            script_memory_limit: 64 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Reads a TOML file if one is given. Missing keys fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}
