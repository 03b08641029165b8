//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ArticleDigest, ArticleRecord, ComposedReport, DomainError, FeedSource, Quote, ReportFileInfo,
    SearchHit, TopicVerdict,
};
use std::collections::HashSet;
use std::path::PathBuf;

/// LLM gateway. Classification, report composition, article digests and embeddings.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    /// Decide whether `topic` is finance-related.
    ///
    /// Returns `DomainError::AiFormat` when the model answered with something that is not
    /// the expected JSON, so callers can tell a bad answer from an unreachable service.
    async fn classify_topic(&self, topic: &str) -> Result<TopicVerdict, DomainError>;

    /// Compose summary, stories and financial context from search results.
    ///
    /// `context_csv` is `Date;Title;URL;Snippet` rows; the model must only cite URLs from it.
    async fn compose_report(
        &self,
        topic: &str,
        context_csv: &str,
    ) -> Result<ComposedReport, DomainError>;

    /// Title, summary and keywords for one article's text.
    async fn summarize_article(&self, text: &str) -> Result<ArticleDigest, DomainError>;

    /// One embedding vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;
}

/// Web search with a freshness window.
#[async_trait::async_trait]
pub trait SearchPort: Send + Sync {
    /// Run `query`, restricted to results from the last `freshness_months` months.
    async fn search(
        &self,
        query: &str,
        freshness_months: u32,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError>;
}

/// Market quotes by ticker symbol.
#[async_trait::async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Quotes for the known symbols. Unknown symbols are simply absent from the result.
    async fn quotes(&self, tickers: &[String]) -> Result<Vec<Quote>, DomainError>;
}

/// Report storage. One Markdown file per report in the output folder.
#[async_trait::async_trait]
pub trait ReportStorePort: Send + Sync {
    /// Write a report. Returns the full path of the stored file.
    async fn save(&self, filename: &str, content: &str) -> Result<PathBuf, DomainError>;

    async fn read(&self, filename: &str) -> Result<String, DomainError>;

    /// All stored `.md` reports, newest first.
    async fn list(&self) -> Result<Vec<ReportFileInfo>, DomainError>;

    async fn delete(&self, filename: &str) -> Result<(), DomainError>;
}

/// Page fetcher.
#[async_trait::async_trait]
pub trait WebPort: Send + Sync {
    /// Body of `url` as text. Implementations retry transient failures.
    async fn fetch_text(&self, url: &str) -> Result<String, DomainError>;
}

/// Per-source ledger of already discovered article URLs.
#[async_trait::async_trait]
pub trait UrlLedgerPort: Send + Sync {
    async fn seen(&self, source_id: &str) -> Result<HashSet<String>, DomainError>;

    /// Merge `urls` into the source's ledger.
    async fn record(&self, source_id: &str, urls: &[String]) -> Result<(), DomainError>;
}

/// Article documents, one JSON file per article.
#[async_trait::async_trait]
pub trait ArticleFilesPort: Send + Sync {
    async fn save(&self, article: &ArticleRecord) -> Result<(), DomainError>;

    /// Load by file id (`<source>_<NNNN>`).
    async fn load(&self, path: &str) -> Result<ArticleRecord, DomainError>;
}

/// Searchable article index (SQLite).
#[async_trait::async_trait]
pub trait ArticleIndexPort: Send + Sync {
    /// Insert an article with its tags and subtags. Returns the new row id.
    async fn insert(&self, article: &ArticleRecord) -> Result<i64, DomainError>;

    /// Remove rows sharing url and path with an older row. Returns rows removed.
    async fn delete_duplicates(&self) -> Result<u64, DomainError>;

    /// Remove articles whose path contains `date`. Returns rows removed.
    async fn delete_by_date(&self, date: &str) -> Result<u64, DomainError>;

    async fn all_paths(&self) -> Result<Vec<String>, DomainError>;

    /// Paths of articles carrying every tag in `tags` and at least one of `subtags`.
    /// An empty list places no constraint.
    async fn find_paths(
        &self,
        tags: &[String],
        subtags: &[String],
    ) -> Result<Vec<String>, DomainError>;
}

/// Configured feed sources and their article counters.
#[async_trait::async_trait]
pub trait SourceCatalogPort: Send + Sync {
    async fn load(&self) -> Result<Vec<FeedSource>, DomainError>;

    async fn save(&self, sources: &[FeedSource]) -> Result<(), DomainError>;
}
