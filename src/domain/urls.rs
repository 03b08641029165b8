//! URL extraction and domain helpers shared by the report pipeline and the API.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use url::Url;

/// Greedy URL match that never ends on closing brackets, quotes or sentence punctuation.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s)\]<>"']+[^\s)\]<>"'.,;]"#).expect("static URL regex")
});

const TRAILING: &[char] = &[',', '.', ')', ']', '>'];

/// Extract every http(s) URL from free text, in first-seen order, without duplicates.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(TRAILING);
        if seen.insert(url.to_string()) {
            out.push(url.to_string());
        }
    }
    out
}

/// Host name of a URL without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Sorted, de-duplicated host names (`netloc`, port excluded) for a set of URLs.
pub fn unique_domains<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter()
        .filter_map(|u| Url::parse(u.as_ref()).ok())
        .filter_map(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// True when the URL's host is a whitelisted domain or one of its sub-domains.
/// An empty whitelist accepts everything.
pub fn is_whitelisted(url: &str, whitelist: &[String]) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    let Some(host) = domain_of(url) else {
        return false;
    };
    whitelist.iter().any(|d| {
        let d = d.trim().to_ascii_lowercase();
        let d = d.strip_prefix("www.").unwrap_or(&d);
        host == d || host.ends_with(&format!(".{}", d))
    })
}

pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    (s.starts_with("http://") || s.starts_with("https://")) && Url::parse(s).is_ok()
}
