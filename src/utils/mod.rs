use regex::Regex;
use reqwest::header::{HeaderMap, SET_COOKIE};

/// Undo the escape encodings pages use for `/` and `&`, so URL matching sees
/// one canonical spelling regardless of whether the URL sat in JSON or HTML.
/// `&quot;` is decoded too so entity-escaped JSON still has string delimiters.
pub fn decode_url_escapes(text: &str) -> String {
    text.replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\/", "/")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
}

/// Value of cookie `name` from any `Set-Cookie` header in the response.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let pattern = format!(r"(?:^|[;,]\s*){}=([^;,\s]+)", regex::escape(name));
    // The name is escaped, so the pattern is always valid.
    let re = Regex::new(&pattern).expect("escaped cookie name forms a valid pattern");

    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| re.captures(raw).map(|c| c[1].to_string()))
}
