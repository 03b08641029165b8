//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the report template and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod feed;
pub mod template;
pub mod urls;

pub use entities::{
    ArticleDigest, ArticleRecord, ComposedReport, FeedSource, INVALID_TICKER, NO_FINANCIAL_DATA,
    NOT_AVAILABLE, NewsReport, NewsStory, PRICE_UNAVAILABLE, Quote, ReportFileInfo, SearchHit,
    SourceKind, TagConfig, TickerQuote, TopicVerdict, normalize_ticker, topic_slug,
    validate_topic_name,
};
pub use errors::DomainError;
pub use feed::{extract_feed_links, extract_page_links, extract_title, html_to_text};
pub use template::{LintReport, ReportAnalysis, analyze, lint, parse_markdown, render_markdown};
pub use urls::{extract_urls, unique_domains};
