//! Ingestion pipeline: discover -> fetch -> summarise -> tag -> index.
//!
//! - Sources run one after another; a failing source does not stop the rest
//! - Only URLs missing from the per-source ledger are fetched
//! - The source's `article_cnt` is advanced and the catalog saved after each source

use crate::domain::{
    ArticleRecord, DomainError, FeedSource, SourceKind, extract_feed_links, extract_page_links,
    extract_title, html_to_text,
};
use crate::ports::{
    ArticleFilesPort, ArticleIndexPort, SourceCatalogPort, UrlLedgerPort, WebPort,
};
use crate::usecases::{Summariser, Tagger};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use url::Url;

/// Per-source outcome of one ingestion run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestStats {
    pub source_id: String,
    pub discovered: usize,
    pub new: usize,
    pub fetched: usize,
    pub summarised: usize,
    pub tagged: usize,
    pub indexed: usize,
    pub duplicates_removed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct IngestService {
    web: Arc<dyn WebPort>,
    files: Arc<dyn ArticleFilesPort>,
    ledger: Arc<dyn UrlLedgerPort>,
    index: Arc<dyn ArticleIndexPort>,
    catalog: Arc<dyn SourceCatalogPort>,
    summariser: Summariser,
    tagger: Tagger,
    fetch_concurrency: usize,
}

impl IngestService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        web: Arc<dyn WebPort>,
        files: Arc<dyn ArticleFilesPort>,
        ledger: Arc<dyn UrlLedgerPort>,
        index: Arc<dyn ArticleIndexPort>,
        catalog: Arc<dyn SourceCatalogPort>,
        summariser: Summariser,
        tagger: Tagger,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            web,
            files,
            ledger,
            index,
            catalog,
            summariser,
            tagger,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    /// Ingest every catalog source, or only the one whose id equals `only`.
    pub async fn run(&self, only: Option<&str>) -> Result<Vec<IngestStats>, DomainError> {
        let mut sources = self.catalog.load().await?;
        if let Some(id) = only {
            if !sources.iter().any(|s| s.id == id) {
                return Err(DomainError::Config(format!("unknown source '{}'", id)));
            }
        }
        info!(sources = sources.len(), "ingestion started");

        let mut all_stats = Vec::new();
        for i in 0..sources.len() {
            if only.is_some_and(|id| sources[i].id != id) {
                continue;
            }
            let source = sources[i].clone();
            let stats = match self.ingest_source(&source).await {
                Ok(stats) => {
                    sources[i].article_cnt += stats.new as u32;
                    self.catalog.save(&sources).await?;
                    stats
                }
                Err(e) => {
                    error!(source_id = %source.id, error = %e, "source ingestion failed");
                    IngestStats {
                        source_id: source.id.clone(),
                        error: Some(e.to_string()),
                        ..Default::default()
                    }
                }
            };
            all_stats.push(stats);
        }
        Ok(all_stats)
    }

    async fn ingest_source(&self, source: &FeedSource) -> Result<IngestStats, DomainError> {
        let mut stats = IngestStats {
            source_id: source.id.clone(),
            ..Default::default()
        };

        let discovered = self.discover(source).await?;
        stats.discovered = discovered.len();

        let seen = self.ledger.seen(&source.id).await?;
        let mut new_urls: Vec<String> = discovered
            .into_iter()
            .filter(|u| !seen.contains(u))
            .collect();
        new_urls.sort();
        new_urls.dedup();
        stats.new = new_urls.len();
        info!(
            source_id = %source.id,
            discovered = stats.discovered,
            new = stats.new,
            "links discovered"
        );
        if new_urls.is_empty() {
            return Ok(stats);
        }

        let numbered: Vec<(String, String)> = new_urls
            .iter()
            .zip(source.article_cnt + 1..)
            .map(|(url, n)| (url.clone(), source.article_path(n)))
            .collect();
        let paths = self.fetch_articles(numbered).await;
        stats.fetched = paths.len();

        stats.summarised = self.summariser.summarise_all(&paths).await.summarised;
        stats.tagged = self.tagger.tag_all(&paths).await;

        for path in &paths {
            match self.files.load(path).await {
                Ok(article) => match self.index.insert(&article).await {
                    Ok(_) => stats.indexed += 1,
                    Err(e) => warn!(path = %path, error = %e, "index insert failed"),
                },
                Err(e) => warn!(path = %path, error = %e, "article missing before indexing"),
            }
        }
        stats.duplicates_removed = self.index.delete_duplicates().await?;

        self.ledger.record(&source.id, &new_urls).await?;
        info!(
            source_id = %source.id,
            fetched = stats.fetched,
            summarised = stats.summarised,
            tagged = stats.tagged,
            indexed = stats.indexed,
            "source ingested"
        );
        Ok(stats)
    }

    /// Article links currently advertised by a source.
    pub async fn discover(&self, source: &FeedSource) -> Result<Vec<String>, DomainError> {
        match &source.kind {
            SourceKind::Rss { rss } => {
                let xml = self.web.fetch_text(rss).await?;
                Ok(extract_feed_links(&xml))
            }
            SourceKind::Page { url, link_pattern } => {
                let base = Url::parse(url)
                    .map_err(|e| DomainError::Config(format!("bad page url '{}': {}", url, e)))?;
                let pattern = Regex::new(link_pattern).map_err(|e| {
                    DomainError::Config(format!("bad link pattern '{}': {}", link_pattern, e))
                })?;
                let html = self.web.fetch_text(url).await?;
                Ok(extract_page_links(&html, &base, &pattern))
            }
        }
    }

    /// Fetch `(url, path)` pairs concurrently and save each page as an article.
    /// Returns the paths that were saved, in input order.
    async fn fetch_articles(&self, numbered: Vec<(String, String)>) -> Vec<String> {
        let semaphore = Arc::new(Semaphore::new(self.fetch_concurrency));
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let mut handles = Vec::with_capacity(numbered.len());

        for (url, path) in numbered {
            let sem = Arc::clone(&semaphore);
            let web = Arc::clone(&self.web);
            let files = Arc::clone(&self.files);
            let date = date.clone();
            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| DomainError::State(e.to_string()))?;
                let html = web.fetch_text(&url).await?;
                let article = ArticleRecord {
                    title: extract_title(&html).unwrap_or_default(),
                    text: Some(html_to_text(&html)),
                    url: url.clone(),
                    path: path.clone(),
                    date,
                    ..Default::default()
                };
                files.save(&article).await?;
                Ok::<String, DomainError>(path)
            }));
        }

        let mut saved = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(path)) => saved.push(path),
                Ok(Err(e)) => warn!(error = %e, "article fetch failed"),
                Err(e) => error!(error = %e, "fetch task panicked"),
            }
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::adapters::persistence::{
        JsonArticleFiles, JsonSourceCatalog, JsonUrlLedger, SqliteRepo,
    };
    use crate::domain::TagConfig;
    use crate::ports::AiPort;
    use std::collections::{BTreeMap, HashMap};

    struct FakeWeb {
        pages: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl WebPort for FakeWeb {
        async fn fetch_text(&self, url: &str) -> Result<String, DomainError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::Web(format!("404 {}", url)))
        }
    }

    fn web() -> FakeWeb {
        let mut pages = HashMap::new();
        pages.insert(
            "https://feed.test/rss".to_string(),
            r#"<rss><channel>
                <item><link>https://feed.test/b</link></item>
                <item><link>https://feed.test/a</link></item>
                <item><link>https://feed.test/missing</link></item>
            </channel></rss>"#
                .to_string(),
        );
        pages.insert(
            "https://feed.test/a".to_string(),
            "<title>Zoho results</title><p>Zoho posted record revenue. Margins held.</p>"
                .to_string(),
        );
        pages.insert(
            "https://feed.test/b".to_string(),
            "<title>Sarvam raise</title><p>Sarvam closed a funding round.</p>".to_string(),
        );
        pages.insert(
            "https://list.test/news".to_string(),
            r#"<a href="/news/1">one</a><a href="/about">about</a>"#.to_string(),
        );
        FakeWeb { pages }
    }

    async fn service(dir: &std::path::Path) -> (IngestService, Arc<JsonSourceCatalog>, Arc<SqliteRepo>) {
        let ai: Arc<dyn AiPort> = Arc::new(MockAiAdapter::with_delay(0));
        let files = Arc::new(JsonArticleFiles::new(dir.join("articles")));
        let catalog = Arc::new(JsonSourceCatalog::new(dir.join("sources.json")));
        let index = Arc::new(SqliteRepo::connect(dir, "articles").await.unwrap());
        let mut proper = BTreeMap::new();
        proper.insert("companies".to_string(), vec!["Zoho".to_string()]);
        let tagger = Tagger::new(
            ai.clone(),
            files.clone(),
            TagConfig {
                keywords_proper: proper,
                keywords_common: BTreeMap::new(),
            },
            0.3,
        );
        let service = IngestService::new(
            Arc::new(web()),
            files.clone(),
            Arc::new(JsonUrlLedger::new(dir.join("urls"))),
            index.clone(),
            catalog.clone(),
            Summariser::new(ai, files, 2),
            tagger,
            2,
        );
        (service, catalog, index)
    }

    fn rss_source() -> FeedSource {
        FeedSource {
            id: "ft".into(),
            kind: SourceKind::Rss {
                rss: "https://feed.test/rss".into(),
            },
            article_cnt: 0,
        }
    }

    #[tokio::test]
    async fn test_run_ingests_new_articles_once() {
        let dir = tempfile::tempdir().unwrap();
        let (service, catalog, index) = service(dir.path()).await;
        catalog.save(&[rss_source()]).await.unwrap();

        let stats = service.run(None).await.unwrap();
        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!((s.discovered, s.new, s.fetched), (3, 3, 2));
        assert_eq!(s.summarised, 2);
        assert_eq!(s.indexed, 2);
        assert!(s.error.is_none());

        // sorted: a -> 0001, b -> 0002, missing -> 0003 (never fetched)
        assert_eq!(index.all_paths().await.unwrap(), vec!["ft_0001", "ft_0002"]);
        let zoho = index
            .find_paths(&["companies".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(zoho, vec!["ft_0001"]);
        assert_eq!(catalog.load().await.unwrap()[0].article_cnt, 3);

        let again = service.run(None).await.unwrap();
        assert_eq!((again[0].discovered, again[0].new), (3, 0));
        assert_eq!(catalog.load().await.unwrap()[0].article_cnt, 3);
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let (service, catalog, _) = service(dir.path()).await;
        let broken = FeedSource {
            id: "broken".into(),
            kind: SourceKind::Page {
                url: "https://list.test/news".into(),
                link_pattern: "(".into(),
            },
            article_cnt: 7,
        };
        catalog.save(&[broken, rss_source()]).await.unwrap();

        let stats = service.run(None).await.unwrap();
        assert!(stats[0].error.as_deref().unwrap().contains("bad link pattern"));
        assert_eq!(stats[1].fetched, 2);
        let saved = catalog.load().await.unwrap();
        assert_eq!(saved[0].article_cnt, 7);
        assert_eq!(saved[1].article_cnt, 3);
    }

    #[tokio::test]
    async fn test_discover_page_links() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _, _) = service(dir.path()).await;
        let page = FeedSource {
            id: "lt".into(),
            kind: SourceKind::Page {
                url: "https://list.test/news".into(),
                link_pattern: r"/news/\d+$".into(),
            },
            article_cnt: 0,
        };
        assert_eq!(
            service.discover(&page).await.unwrap(),
            vec!["https://list.test/news/1"]
        );
    }

    #[tokio::test]
    async fn test_run_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let (service, catalog, _) = service(dir.path()).await;
        catalog.save(&[rss_source()]).await.unwrap();
        assert!(matches!(
            service.run(Some("nope")).await,
            Err(DomainError::Config(_))
        ));
    }
}
