// ABOUTME: URL detection in free text
// ABOUTME: Used to auto-populate detected sources on research notes and reports

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ASCII word boundary: a URL followed directly by non-ASCII letters still ends there
    static ref URL_PATTERN: Regex = Regex::new(
        r"(?i)https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}(?-u:\b)(?:[-a-zA-Z0-9()@:%_+.~#?&/=]*)"
    )
    .expect("URL pattern is a valid regex");
}

/// Extract every http(s) URL from `text`.
///
/// Duplicates are dropped and the order of first appearance is kept. Text
/// without URLs yields an empty list; this never fails.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for m in URL_PATTERN.find_iter(text) {
        let url = m.as_str();
        if !urls.iter().any(|seen| seen == url) {
            urls.push(url.to_string());
        }
    }

    urls
}

/// Whether `text` contains at least one URL
pub fn contains_url(text: &str) -> bool {
    URL_PATTERN.is_match(text)
}
