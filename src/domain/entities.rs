//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/LLM/IO types here; adapters map into these.

use super::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder for any value the research could not establish.
pub const NOT_AVAILABLE: &str = "Not Available";
/// Financial context for a story without a listed company.
pub const NO_FINANCIAL_DATA: &str = "No financial data";
/// Quote returned without price or change.
pub const PRICE_UNAVAILABLE: &str = "Price data not available.";
/// Ticker the market data source did not recognise (or the lookup failed).
pub const INVALID_TICKER: &str = "Invalid Ticker or Data Error";

/// A single news item of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsStory {
    pub headline: String,
    /// Publication date, `None` when unknown.
    #[serde(default)]
    pub date: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub why_it_matters: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    /// Quote line, e.g. `$950.00 (+1.50%)`.
    #[serde(default)]
    pub financial_context: Option<String>,
    #[serde(default)]
    pub source_domain: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Ticker with its rendered quote line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub ticker: String,
    pub display: String,
}

/// A complete finance news report, ready to be rendered to Markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsReport {
    pub topic: String,
    pub title: String,
    pub summary: String,
    pub stories: Vec<NewsStory>,
    pub financial_context: String,
    pub market_data: Vec<TickerQuote>,
    pub sourcing_notes: Vec<String>,
    pub source_urls: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl NewsReport {
    pub fn title_for(topic: &str) -> String {
        format!("Finance News Report: {}", topic)
    }
}

/// Outcome of the finance-topic classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicVerdict {
    pub is_finance: bool,
    pub reason: String,
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    #[serde(default)]
    pub published: Option<String>,
}

/// Structured report content produced by the LLM from search context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposedReport {
    pub summary: String,
    #[serde(default)]
    pub stories: Vec<NewsStory>,
    #[serde(default)]
    pub financial_context: String,
}

/// Raw quote from a market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    /// Daily change in percent (1.5 means +1.5%).
    pub change_percent: Option<f64>,
}

impl Quote {
    /// `$950.00 (+1.50%)`, or the "not available" line when either value is missing.
    pub fn display(&self) -> String {
        match (self.price, self.change_percent) {
            (Some(price), Some(change)) => format!("${:.2} ({:+.2}%)", price, change),
            _ => PRICE_UNAVAILABLE.to_string(),
        }
    }
}

/// Where the ingestion pipeline discovers article links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS, Atom or sitemap document.
    Rss { rss: String },
    /// HTML listing page; anchors whose absolute URL matches `link_pattern` are taken.
    Page { url: String, link_pattern: String },
}

/// A configured feed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    /// Number of articles already numbered for this source.
    #[serde(default)]
    pub article_cnt: u32,
}

impl FeedSource {
    /// File id for the `n`-th article of this source (1-based): `<id>_0042`.
    pub fn article_path(&self, n: u32) -> String {
        format!("{}_{:04}", self.id, n)
    }
}

/// On-disk article document, enriched stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
    pub date: String,
    /// Extracted page text; dropped once the article is summarised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtags: Vec<String>,
}

impl ArticleRecord {
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// LLM summary of one article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDigest {
    #[serde(default)]
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Keyword tagging rules (`tags.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagConfig {
    /// Tag -> names matched literally (companies, people, places).
    #[serde(default)]
    pub keywords_proper: BTreeMap<String, Vec<String>>,
    /// Tag -> generic terms matched by semantic similarity.
    #[serde(default)]
    pub keywords_common: BTreeMap<String, Vec<String>>,
}

/// Stored report file metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFileInfo {
    pub filename: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Validate a user-supplied topic. Returns the trimmed topic.
pub fn validate_topic_name(raw: &str) -> Result<String, DomainError> {
    let topic = raw.trim();
    if topic.is_empty() {
        return Err(DomainError::InvalidTopic("Topic is required".into()));
    }
    if topic.chars().count() < 2 {
        return Err(DomainError::InvalidTopic(
            "Topic must be at least 2 characters".into(),
        ));
    }
    Ok(topic.to_string())
}

/// Filesystem-safe slug: lowercase ASCII alphanumeric runs joined by `_`.
pub fn topic_slug(topic: &str) -> String {
    let mut slug = String::new();
    for word in topic
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }
    slug.truncate(40);
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

/// Upper-cased ticker, or `None` for placeholders like `N/A`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let t = raw.trim().to_uppercase();
    match t.as_str() {
        "" | "N/A" | "NA" => None,
        _ => Some(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_topic_name() {
        assert_eq!(validate_topic_name("  Zoho ").unwrap(), "Zoho");
        assert!(matches!(
            validate_topic_name("   "),
            Err(DomainError::InvalidTopic(_))
        ));
        assert!(matches!(
            validate_topic_name("Z"),
            Err(DomainError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_topic_slug() {
        assert_eq!(topic_slug("Sarvam AI"), "sarvam_ai");
        assert_eq!(topic_slug("  Tata Motors (TTM) "), "tata_motors_ttm");
        assert_eq!(topic_slug("日本"), "report");
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" nvda "), Some("NVDA".to_string()));
        assert_eq!(normalize_ticker("N/A"), None);
        assert_eq!(normalize_ticker("na"), None);
        assert_eq!(normalize_ticker(""), None);
    }

    #[test]
    fn test_quote_display() {
        let q = Quote {
            symbol: "NVDA".into(),
            price: Some(950.0),
            change_percent: Some(1.5),
        };
        assert_eq!(q.display(), "$950.00 (+1.50%)");

        let down = Quote {
            change_percent: Some(-0.256),
            ..q.clone()
        };
        assert_eq!(down.display(), "$950.00 (-0.26%)");

        let missing = Quote {
            price: None,
            ..q
        };
        assert_eq!(missing.display(), PRICE_UNAVAILABLE);
    }

    #[test]
    fn test_feed_source_serde() {
        let json = r#"[
            {"id": "inc42", "type": "rss", "rss": "https://inc42.com/feed/", "article_cnt": 12},
            {"id": "et", "type": "page", "url": "https://example.com/news", "link_pattern": "/news/\\d+"}
        ]"#;
        let sources: Vec<FeedSource> = serde_json::from_str(json).unwrap();
        assert_eq!(sources[0].article_cnt, 12);
        assert_eq!(
            sources[0].kind,
            SourceKind::Rss {
                rss: "https://inc42.com/feed/".into()
            }
        );
        assert_eq!(sources[1].article_cnt, 0);
        assert_eq!(sources[0].article_path(13), "inc42_0013");
    }
}
