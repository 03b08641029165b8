//! Link discovery and text extraction for feeds and article pages.
//!
//! Feeds (RSS, Atom, sitemaps) and listing pages are scanned with regular
//! expressions; documents are never fully parsed, so malformed markup degrades
//! to fewer links rather than an error.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Link targets that are never articles.
const SKIPPED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

static FEED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>|<entry\b[^>]*>(.*?)</entry>|<url\b[^>]*>(.*?)</url>")
        .expect("static feed block regex")
});
static LINK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<link\b([^>]*?)(/?)>").expect("static link regex")
});
static LOC_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<loc\b([^>]*?)(/?)>").expect("static loc regex"));
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static href regex")
});
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("static anchor regex")
});
static DROP_BLOCKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<!--.*?-->",
    )
    .expect("static drop regex")
});
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|br|li|ul|ol|h[1-6]|tr|table|article|section|header|footer|blockquote)\b[^>]*>")
        .expect("static block tag regex")
});
static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static tag regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("static title regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("static entity regex"));

fn is_article_link(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("http") && !SKIPPED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn strip_cdata(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(s)
}

fn href_of(attrs: &str) -> Option<String> {
    let caps = HREF_ATTR_RE.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| decode_entities(m.as_str().trim()))
}

/// First `<tag>` in `block`: its `href` attribute, or else its text content.
fn first_tag_link(block: &str, tag_re: &Regex, tag: &str) -> Option<String> {
    let caps = tag_re.captures(block)?;
    if let Some(href) = href_of(&caps[1]) {
        return Some(href);
    }
    if !caps[2].is_empty() {
        return None;
    }
    let rest = &block[caps.get(0)?.end()..];
    let close = format!("</{}>", tag);
    let end = rest.to_ascii_lowercase().find(&close)?;
    Some(decode_entities(strip_cdata(&rest[..end])))
}

/// Article links of an RSS, Atom or sitemap document.
///
/// Inside each `<item>`, `<entry>` or `<url>` block the first `<link>` and `<loc>`
/// are read (attribute `href` first, then text). Non-http targets and images/PDFs
/// are dropped. Order follows the document; duplicates are removed.
pub fn extract_feed_links(xml: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for caps in FEED_BLOCK_RE.captures_iter(xml) {
        let Some(block) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };
        let block = block.as_str();
        let candidates = [
            first_tag_link(block, &LINK_TAG_RE, "link"),
            first_tag_link(block, &LOC_TAG_RE, "loc"),
        ];
        for link in candidates.into_iter().flatten() {
            let link = link.trim().to_string();
            if is_article_link(&link) && seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }
    links
}

/// Anchor targets of an HTML page, resolved against `base`, that match `pattern`.
///
/// Fragments are removed; only http(s) URLs are kept; duplicates are removed.
pub fn extract_page_links(html: &str, base: &Url, pattern: &Regex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for caps in ANCHOR_RE.captures_iter(html) {
        let Some(raw) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let raw = decode_entities(raw.as_str().trim());
        if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") {
            continue;
        }
        let Ok(mut url) = base.join(&raw) else {
            continue;
        };
        url.set_fragment(None);
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        let url = url.to_string();
        if pattern.is_match(&url) && is_article_link(&url) && seen.insert(url.clone()) {
            links.push(url);
        }
    }
    links
}

/// Contents of `<title>`, entity-decoded and whitespace-collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let title = collapse_spaces(&decode_entities(strip_cdata(raw)));
    (!title.is_empty()).then_some(title)
}

/// Readable text of an HTML page: scripts, styles and comments removed, block
/// elements turned into line breaks, tags stripped, entities decoded, blank lines dropped.
pub fn html_to_text(html: &str) -> String {
    let without_blocks = DROP_BLOCKS_RE.replace_all(html, " ");
    let with_breaks = BLOCK_TAG_RE.replace_all(&without_blocks, "\n");
    let stripped = ANY_TAG_RE.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&stripped);
    decoded
        .lines()
        .map(collapse_spaces)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the named entities common in news markup plus numeric references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let numeric = NUMERIC_ENTITY_RE.replace_all(s, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rdquo;", "\u{201d}")
        .replace("&ldquo;", "\u{201c}")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_links() {
        let xml = r#"<?xml version="1.0"?>
<rss><channel>
  <link>https://inc42.com</link>
  <item><title>A</title><link>https://inc42.com/buzz/a/</link></item>
  <item><title>B</title><link><![CDATA[ https://inc42.com/buzz/b/?x=1&amp;y=2 ]]></link></item>
  <item><title>Img</title><link>https://inc42.com/cover.JPG</link></item>
  <item><title>Dup</title><link>https://inc42.com/buzz/a/</link></item>
</channel></rss>"#;
        assert_eq!(
            extract_feed_links(xml),
            vec!["https://inc42.com/buzz/a/", "https://inc42.com/buzz/b/?x=1&y=2"]
        );
    }

    #[test]
    fn test_atom_and_sitemap_links() {
        let atom = r#"<feed><entry><link rel="alternate" href="https://example.com/post-1"/></entry>
                      <entry><link href='https://example.com/report.pdf'/></entry></feed>"#;
        assert_eq!(extract_feed_links(atom), vec!["https://example.com/post-1"]);

        let sitemap = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc>https://example.com/news/1</loc><lastmod>2025-05-01</lastmod></url>
            <url><loc>ftp://example.com/x</loc></url>
        </urlset>"#;
        assert_eq!(extract_feed_links(sitemap), vec!["https://example.com/news/1"]);
    }

    #[test]
    fn test_page_links_resolve_and_filter() {
        let base = Url::parse("https://example.com/news/").unwrap();
        let pattern = Regex::new(r"/news/\d+").unwrap();
        let html = r##"<a href="/news/101">One</a>
            <a class="x" href='102#comments'>Two</a>
            <a href="https://other.com/news/5">Three</a>
            <a href="/about">About</a>
            <a href="#top">Top</a>
            <a href="/news/101">Again</a>"##;
        assert_eq!(
            extract_page_links(html, &base, &pattern),
            vec![
                "https://example.com/news/101",
                "https://example.com/news/102",
                "https://other.com/news/5",
            ]
        );
    }

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><title>T</title><style>.a{color:red}</style>
            <script>var x = "<p>";</script></head>
            <body><!-- nav --><h1>Zoho&nbsp;grows</h1><p>Revenue   rose &amp; profits&#33;</p>
            <div>Second<br/>line</div></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "T\nZoho grows\nRevenue rose & profits!\nSecond\nline");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<title>\n  Sarvam &amp; IndiaAI | Inc42 </title>").as_deref(),
            Some("Sarvam & IndiaAI | Inc42")
        );
        assert_eq!(extract_title("<title> </title>"), None);
        assert_eq!(extract_title("<p>none</p>"), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#x41;&#66;"), "a <b> AB");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
