use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, REFERER};
use rquickjs::function::This;
use rquickjs::{Object, Value};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::config::{Config, DOUYIN};
use crate::core::error::{ResolveError, Result};
use crate::core::fetch::Fetcher;
use crate::core::media::{FetchResult, Identity};
use crate::extractors::js_interpreter::{SandboxBindings, ScriptSandbox};
use crate::utils::cookie_value;

static CHALLENGE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)<script>(.*?)</script>\s*{}",
        regex::escape(DOUYIN.script_end_marker)
    ))
    .unwrap()
});

/// Nonce and verification script taken from a challenge page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub nonce: String,
    pub script_source: String,
}

fn unsolvable(reason: &str) -> ResolveError {
    ResolveError::ChallengeUnsolvable(reason.to_string())
}

pub fn html_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DOUYIN.accept_html));
    headers
}

pub fn extract_challenge_script(html: &str) -> Option<String> {
    CHALLENGE_SCRIPT
        .captures(html)
        .map(|captures| captures[1].to_string())
}

/// `Ok(None)` means the page was served directly. A page that shows either
/// the crawler marker or a nonce cookie is a challenge, and then both the
/// nonce and the script must be present.
pub fn detect_challenge(page: &FetchResult) -> Result<Option<Challenge>> {
    let nonce = cookie_value(&page.headers, DOUYIN.nonce_cookie);
    let has_marker = page.body.contains(DOUYIN.challenge_marker);

    if !has_marker && nonce.is_none() {
        return Ok(None);
    }

    let nonce = nonce.ok_or_else(|| unsolvable("challenge page set no nonce cookie"))?;
    let script_source =
        extract_challenge_script(&page.body).ok_or_else(|| unsolvable("challenge script not found"))?;

    Ok(Some(Challenge {
        nonce,
        script_source,
    }))
}

pub fn build_cookie(nonce: &str, signature: &str) -> String {
    format!(
        "{}={}; {}={}; {}",
        DOUYIN.nonce_cookie, nonce, DOUYIN.signature_cookie, signature, DOUYIN.referer_cookie
    )
}

/// Run the challenge script and ask the crawler object it installs for a
/// signature over an empty payload and the nonce.
pub fn sign_challenge(
    sandbox: &ScriptSandbox,
    challenge: &Challenge,
    bindings: &SandboxBindings,
) -> Result<String> {
    let nonce = challenge.nonce.as_str();

    sandbox.evaluate(
        &challenge.script_source,
        bindings,
        DOUYIN.crawler_object,
        |ctx, exported| {
            let crawler: Object = exported
                .as_object()
                .cloned()
                .ok_or_else(|| unsolvable("byted_acrawler not available"))?;

            let sign: Value = crawler.get("sign")?;
            let sign = sign
                .as_function()
                .cloned()
                .ok_or_else(|| unsolvable("byted_acrawler.sign is not callable"))?;

            let init: Value = crawler.get("init")?;
            if let Some(init) = init.as_function() {
                let options = Object::new(ctx.clone())?;
                options.set("aid", 99999999)?;
                options.set("dfp", 0)?;
                let _: Value = init.call((This(crawler.clone()), options))?;
            }

            let signature: Value = sign.call((This(crawler.clone()), "", nonce))?;
            let signature = match signature.as_string() {
                Some(s) => s.to_string()?,
                None => String::new(),
            };
            if signature.is_empty() {
                return Err(unsolvable("failed to compute __ac_signature"));
            }
            Ok(signature)
        },
    )
}

/// Fetches desktop pages, transparently passing the ACR challenge when the
/// site interposes one.
#[derive(Clone)]
pub struct ChallengeSolver {
    fetcher: Arc<dyn Fetcher>,
    sandbox: ScriptSandbox,
}

impl ChallengeSolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            sandbox: ScriptSandbox::new(config),
        }
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let first = self
            .fetcher
            .fetch(url, Identity::Desktop, html_headers())
            .await?;

        let Some(challenge) = detect_challenge(&first)? else {
            debug!("No challenge on {}", first.final_url);
            return Ok(first.body);
        };

        info!("Solving ACR challenge for {}", first.final_url);
        let signature = self.compute_signature(challenge.clone(), &first.final_url).await?;
        debug!("Computed signature ({} chars)", signature.len());

        let cookie = build_cookie(&challenge.nonce, &signature);
        let mut headers = html_headers();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie)
                .map_err(|_| unsolvable("signature is not a valid header value"))?,
        );
        headers.insert(REFERER, HeaderValue::from_static(DOUYIN.challenge_referer));

        let second = self
            .fetcher
            .fetch(&first.final_url, Identity::Desktop, headers)
            .await?;

        if second.body.contains(DOUYIN.challenge_marker) {
            warn!("Page still looks challenged after signing: {}", second.final_url);
        }

        Ok(second.body)
    }

    async fn compute_signature(&self, challenge: Challenge, page_url: &str) -> Result<String> {
        let sandbox = self.sandbox;
        let bindings = SandboxBindings {
            user_agent: Identity::Desktop.user_agent().to_string(),
            page_url: page_url.to_string(),
            cookie: format!("{}={}", DOUYIN.nonce_cookie, challenge.nonce),
        };

        tokio::task::spawn_blocking(move || sign_challenge(&sandbox, &challenge, &bindings))
            .await
            .map_err(|e| ResolveError::ChallengeUnsolvable(format!("sandbox task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::SET_COOKIE;

    const SIGNING_SCRIPT: &str = r#"
        window.byted_acrawler = {
            aid: 0,
            init: function (opts) { this.aid = opts.aid; },
            sign: function (body, nonce) {
                return "sig-" + nonce + "-" + this.aid + "-" + document.cookie;
            }
        };
    "#;

    fn page(body: &str, set_cookie: Option<&'static str>) -> FetchResult {
        let mut headers = HeaderMap::new();
        if let Some(value) = set_cookie {
            headers.insert(SET_COOKIE, HeaderValue::from_static(value));
        }
        FetchResult {
            final_url: "https://www.douyin.com/note/1".to_string(),
            body: body.to_string(),
            headers,
        }
    }

    fn challenge_html(script: &str) -> String {
        format!(
            "<html><head><script>{}</script>\n  <script>function _f1(){{}}</script></head></html>",
            script
        )
    }

    fn bindings(nonce: &str) -> SandboxBindings {
        SandboxBindings {
            user_agent: "UA".to_string(),
            page_url: "https://www.douyin.com/note/1".to_string(),
            cookie: format!("__ac_nonce={}", nonce),
        }
    }

    fn sandbox() -> ScriptSandbox {
        ScriptSandbox::new(&Config::default())
    }

    #[test]
    fn test_extract_challenge_script() {
        let html = challenge_html("var a = 1;");
        assert_eq!(extract_challenge_script(&html).as_deref(), Some("var a = 1;"));
        assert_eq!(extract_challenge_script("<script>var a;</script>"), None);
    }

    #[test]
    fn test_plain_page_is_direct() {
        let result = detect_challenge(&page("<html>ok</html>", None)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_challenge_detected() {
        let html = challenge_html("window.byted_acrawler = {};");
        let result = detect_challenge(&page(&html, Some("__ac_nonce=n0nce; Path=/"))).unwrap();
        assert_eq!(
            result,
            Some(Challenge {
                nonce: "n0nce".to_string(),
                script_source: "window.byted_acrawler = {};".to_string(),
            })
        );
    }

    #[test]
    fn test_marker_without_nonce_is_unsolvable() {
        let html = challenge_html("window.byted_acrawler = {};");
        let err = detect_challenge(&page(&html, None)).unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));
    }

    #[test]
    fn test_nonce_without_script_is_unsolvable() {
        let err = detect_challenge(&page("<html>nothing</html>", Some("__ac_nonce=abc")))
            .unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));
    }

    #[test]
    fn test_build_cookie() {
        assert_eq!(
            build_cookie("n", "s"),
            "__ac_nonce=n; __ac_signature=s; __ac_referer=__ac_blank"
        );
    }

    #[test]
    fn test_sign_challenge_calls_init_then_sign() {
        let challenge = Challenge {
            nonce: "abc".to_string(),
            script_source: SIGNING_SCRIPT.to_string(),
        };
        let signature = sign_challenge(&sandbox(), &challenge, &bindings("abc")).unwrap();
        assert_eq!(signature, "sig-abc-99999999-__ac_nonce=abc");
    }

    #[test]
    fn test_sign_challenge_is_deterministic() {
        let challenge = Challenge {
            nonce: "abc".to_string(),
            script_source: SIGNING_SCRIPT.to_string(),
        };
        let first = sign_challenge(&sandbox(), &challenge, &bindings("abc")).unwrap();
        let second = sign_challenge(&sandbox(), &challenge, &bindings("abc")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sign_without_init_is_allowed() {
        let challenge = Challenge {
            nonce: "n".to_string(),
            script_source: "window.byted_acrawler = { sign: function (b, n) { return n + navigator.userAgent; } };"
                .to_string(),
        };
        let signature = sign_challenge(&sandbox(), &challenge, &bindings("n")).unwrap();
        assert_eq!(signature, "nUA");
    }

    #[test]
    fn test_missing_crawler_object_is_unsolvable() {
        let challenge = Challenge {
            nonce: "n".to_string(),
            script_source: "var somethingElse = 1;".to_string(),
        };
        let err = sign_challenge(&sandbox(), &challenge, &bindings("n")).unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));
    }

    #[test]
    fn test_non_callable_sign_is_unsolvable() {
        let challenge = Challenge {
            nonce: "n".to_string(),
            script_source: "window.byted_acrawler = { sign: 'nope' };".to_string(),
        };
        let err = sign_challenge(&sandbox(), &challenge, &bindings("n")).unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));
    }

    #[test]
    fn test_empty_signature_is_unsolvable() {
        let challenge = Challenge {
            nonce: "n".to_string(),
            script_source: "window.byted_acrawler = { sign: function () { return ''; } };"
                .to_string(),
        };
        let err = sign_challenge(&sandbox(), &challenge, &bindings("n")).unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));

        let challenge = Challenge {
            nonce: "n".to_string(),
            script_source: "window.byted_acrawler = { sign: function () { return 42; } };"
                .to_string(),
        };
        let err = sign_challenge(&sandbox(), &challenge, &bindings("n")).unwrap_err();
        assert!(matches!(err, ResolveError::ChallengeUnsolvable(_)));
    }
}
