//! Report pipeline: topic check, whitelisted search, LLM composition, market
//! enrichment, Markdown rendering and storage.
//!
//! Every external step degrades instead of failing the request: a bad classifier
//! answer accepts the topic, a failed search query is skipped, a failed composition
//! falls back to listing search results, and failed quotes are marked per ticker.

use crate::adapters::ai::hits_to_csv;
use crate::domain::template::{LintReport, ReportAnalysis};
use crate::domain::urls::{domain_of, is_http_url, is_whitelisted};
use crate::domain::{
    ComposedReport, DomainError, INVALID_TICKER, NO_FINANCIAL_DATA, NewsReport, NewsStory,
    ReportFileInfo, SearchHit, TickerQuote, TopicVerdict, analyze, extract_urls, lint,
    normalize_ticker, render_markdown, topic_slug, unique_domains, validate_topic_name,
};
use crate::ports::{AiPort, MarketDataPort, ReportStorePort, SearchPort};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

pub const ACCEPTED_ON_PARSE_ISSUE: &str = "Topic accepted (validation response parsing issue)";
pub const ACCEPTED_ON_SERVICE_ISSUE: &str =
    "Topic accepted (validation service temporarily unavailable)";

/// Tunables of the report pipeline.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// News domains searches are restricted to. Empty means unrestricted.
    pub whitelist: Vec<String>,
    pub freshness_months: u32,
    pub results_per_query: usize,
    /// Upper bound on the CSV context sent to the composer.
    pub max_context_chars: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            whitelist: Vec::new(),
            freshness_months: 6,
            results_per_query: 10,
            max_context_chars: 30_000,
        }
    }
}

/// Result of one `generate` call.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub session_id: String,
    pub topic: String,
    pub report: NewsReport,
    pub markdown: String,
    /// File name inside the output folder.
    pub markdown_file: String,
    pub all_source_urls: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub lint: LintReport,
}

/// Stored report with the number of URLs it cites.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub info: ReportFileInfo,
    pub url_count: usize,
}

pub struct ReportService {
    ai: Arc<dyn AiPort>,
    search: Arc<dyn SearchPort>,
    market: Arc<dyn MarketDataPort>,
    store: Arc<dyn ReportStorePort>,
    settings: ReportSettings,
}

/// Append `site:` filters for the whitelist unless the query already targets a whitelisted site.
pub fn decorate_query(query: &str, whitelist: &[String]) -> String {
    if whitelist.is_empty() {
        return query.to_string();
    }
    let lower = query.to_lowercase();
    if whitelist
        .iter()
        .any(|d| lower.contains(&format!("site:{}", d.to_lowercase())))
    {
        return query.to_string();
    }
    let sites = whitelist
        .iter()
        .map(|d| format!("site:{}", d))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{} {}", query, sites)
}

/// The three research angles searched for every topic.
pub fn research_queries(topic: &str) -> [String; 3] {
    [
        format!("{} news", topic),
        format!("{} funding OR earnings OR acquisition", topic),
        format!("{} stock OR valuation OR revenue", topic),
    ]
}

/// Eight hex characters from a fresh v4 UUID.
fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl ReportService {
    pub fn new(
        ai: Arc<dyn AiPort>,
        search: Arc<dyn SearchPort>,
        market: Arc<dyn MarketDataPort>,
        store: Arc<dyn ReportStorePort>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            ai,
            search,
            market,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Classify the topic. Only a definite "not finance" answer rejects it.
    pub async fn check_topic(&self, topic: &str) -> TopicVerdict {
        match self.ai.classify_topic(topic).await {
            Ok(verdict) => verdict,
            Err(DomainError::AiFormat(e)) => {
                warn!(topic, error = %e, "topic classifier answered in an unexpected format");
                TopicVerdict {
                    is_finance: true,
                    reason: ACCEPTED_ON_PARSE_ISSUE.to_string(),
                }
            }
            Err(e) => {
                warn!(topic, error = %e, "topic classifier unavailable");
                TopicVerdict {
                    is_finance: true,
                    reason: ACCEPTED_ON_SERVICE_ISSUE.to_string(),
                }
            }
        }
    }

    /// Run the full pipeline for `raw_topic` and store the rendered report.
    pub async fn generate(&self, raw_topic: &str) -> Result<GeneratedReport, DomainError> {
        let topic = validate_topic_name(raw_topic)?;

        let verdict = self.check_topic(&topic).await;
        if !verdict.is_finance {
            info!(topic = %topic, reason = %verdict.reason, "topic rejected");
            return Err(DomainError::TopicRejected {
                topic,
                reason: verdict.reason,
            });
        }

        let run_id = short_id();
        let session_id = format!("report_{}", run_id);
        info!(topic = %topic, session_id = %session_id, reason = %verdict.reason, "report generation started");

        let mut notes = Vec::new();
        let hits = self.gather_hits(&topic, &mut notes).await;

        let composed = self.compose(&topic, &hits, &mut notes).await;
        let mut stories = self.normalise_stories(composed.stories, &hits, &mut notes);
        let market_data = self.enrich_with_quotes(&mut stories, &mut notes).await;

        let mut seen = HashSet::new();
        let source_urls: Vec<String> = hits
            .iter()
            .map(|h| h.url.clone())
            .chain(stories.iter().filter_map(|s| s.source_url.clone()))
            .filter(|u| seen.insert(u.clone()))
            .collect();

        let generated_at = Utc::now();
        let report = NewsReport {
            title: NewsReport::title_for(&topic),
            topic: topic.clone(),
            summary: composed.summary,
            stories,
            financial_context: composed.financial_context,
            market_data,
            sourcing_notes: notes,
            source_urls,
            generated_at,
        };

        let markdown = render_markdown(&report);
        let lint = lint(&markdown);
        for issue in &lint.issues {
            warn!(session_id = %session_id, line = ?issue.line, severity = ?issue.severity, "{}", issue.message);
        }

        let markdown_file = format!(
            "finance_research_report_{}_{}.md",
            topic_slug(&topic),
            run_id
        );
        self.store.save(&markdown_file, &markdown).await?;
        let all_source_urls = extract_urls(&markdown);

        info!(
            session_id = %session_id,
            file = %markdown_file,
            stories = report.stories.len(),
            urls = all_source_urls.len(),
            "report generation complete"
        );

        Ok(GeneratedReport {
            session_id,
            topic,
            report,
            markdown,
            markdown_file,
            all_source_urls,
            generated_at,
            lint,
        })
    }

    /// Search every research angle; de-duplicate and keep whitelisted hits only.
    async fn gather_hits(&self, topic: &str, notes: &mut Vec<String>) -> Vec<SearchHit> {
        let s = &self.settings;
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        let mut dropped = 0usize;

        for query in research_queries(topic) {
            let decorated = decorate_query(&query, &s.whitelist);
            match self
                .search
                .search(&decorated, s.freshness_months, s.results_per_query)
                .await
            {
                Ok(found) => {
                    info!(query = %query, found = found.len(), "search complete");
                    for hit in found {
                        if !is_http_url(&hit.url) || !seen.insert(hit.url.clone()) {
                            continue;
                        }
                        if is_whitelisted(&hit.url, &s.whitelist) {
                            hits.push(hit);
                        } else {
                            dropped += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search query failed");
                    notes.push(format!("Search for \"{}\" failed: {}", query, e));
                }
            }
        }

        if !s.whitelist.is_empty() {
            notes.push(format!(
                "Search restricted to whitelisted news domains: {}.",
                s.whitelist.join(", ")
            ));
        }
        notes.push(format!(
            "Coverage limited to news from the last {} months.",
            s.freshness_months
        ));
        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        let domains = unique_domains(&urls);
        if domains.is_empty() {
            notes.push("Action: No news sources returned results for this topic.".to_string());
        } else {
            notes.push(format!(
                "Action: Sourced news from the following domains: {}.",
                domains.join(", ")
            ));
        }
        if dropped > 0 {
            notes.push(format!(
                "Discarded {} results from non-whitelisted domains.",
                dropped
            ));
        }
        hits
    }

    async fn compose(
        &self,
        topic: &str,
        hits: &[SearchHit],
        notes: &mut Vec<String>,
    ) -> ComposedReport {
        if hits.is_empty() {
            return ComposedReport {
                summary: format!(
                    "No news coverage of {} was found in the last {} months from the permitted sources.",
                    topic, self.settings.freshness_months
                ),
                ..Default::default()
            };
        }

        let context = hits_to_csv(hits, self.settings.max_context_chars)
            .map_err(|e| DomainError::State(format!("CSV context: {}", e)));
        let result = match context {
            Ok((csv, rows)) => {
                if rows < hits.len() {
                    notes.push(format!(
                        "{} of {} search results fit in the analysis context.",
                        rows,
                        hits.len()
                    ));
                }
                self.ai.compose_report(topic, &csv).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(composed) => composed,
            Err(e) => {
                warn!(topic, error = %e, "report composition failed, listing search results");
                notes.push(format!(
                    "Automated synthesis failed ({}); stories are listed directly from search results.",
                    e
                ));
                ComposedReport {
                    summary: format!(
                        "Automated synthesis was unavailable for this report. The stories below are the \
                         most relevant search results about {} from the last {} months.",
                        topic, self.settings.freshness_months
                    ),
                    stories: hits.iter().map(story_from_hit).collect(),
                    financial_context: String::new(),
                }
            }
        }
    }

    /// Clean story URLs, fill source domains and note citations outside the search results.
    fn normalise_stories(
        &self,
        stories: Vec<NewsStory>,
        hits: &[SearchHit],
        notes: &mut Vec<String>,
    ) -> Vec<NewsStory> {
        let hit_urls: HashSet<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        let mut unsourced = 0;
        let stories: Vec<NewsStory> = stories
            .into_iter()
            .map(|mut story| {
                story.source_url = story
                    .source_url
                    .as_deref()
                    .and_then(|u| extract_urls(u).into_iter().next());
                match story.source_url.as_deref() {
                    Some(url) => {
                        if !hit_urls.contains(url) {
                            unsourced += 1;
                        }
                        story.source_domain = domain_of(url);
                    }
                    None => unsourced += 1,
                }
                story
            })
            .collect();
        if unsourced > 0 {
            notes.push(format!(
                "{} of {} stories cite a source that was not among the search results.",
                unsourced,
                stories.len()
            ));
        }
        stories
    }

    /// Attach quote lines to stories with tickers. Returns one entry per ticker.
    async fn enrich_with_quotes(
        &self,
        stories: &mut [NewsStory],
        notes: &mut Vec<String>,
    ) -> Vec<TickerQuote> {
        let mut tickers: Vec<String> = Vec::new();
        for story in stories.iter_mut() {
            story.ticker = story.ticker.as_deref().and_then(normalize_ticker);
            if let Some(t) = &story.ticker {
                if !tickers.contains(t) {
                    tickers.push(t.clone());
                }
            }
        }

        let displays: HashMap<String, String> = if tickers.is_empty() {
            HashMap::new()
        } else {
            match self.market.quotes(&tickers).await {
                Ok(quotes) => {
                    let by_symbol: HashMap<String, String> = quotes
                        .into_iter()
                        .map(|q| (q.symbol.to_uppercase(), q.display()))
                        .collect();
                    tickers
                        .iter()
                        .map(|t| {
                            let display = by_symbol
                                .get(t)
                                .cloned()
                                .unwrap_or_else(|| INVALID_TICKER.to_string());
                            (t.clone(), display)
                        })
                        .collect()
                }
                Err(e) => {
                    warn!(error = %e, tickers = ?tickers, "market data lookup failed");
                    notes.push(format!("Market data unavailable: {}", e));
                    tickers
                        .iter()
                        .map(|t| (t.clone(), INVALID_TICKER.to_string()))
                        .collect()
                }
            }
        };

        for story in stories.iter_mut() {
            story.financial_context = Some(match &story.ticker {
                Some(t) => displays
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| INVALID_TICKER.to_string()),
                None => NO_FINANCIAL_DATA.to_string(),
            });
        }

        tickers
            .into_iter()
            .map(|t| TickerQuote {
                display: displays
                    .get(&t)
                    .cloned()
                    .unwrap_or_else(|| INVALID_TICKER.to_string()),
                ticker: t,
            })
            .collect()
    }

    /// Stored reports, newest first, with the number of URLs each one cites.
    pub async fn list_reports(&self) -> Result<Vec<ReportEntry>, DomainError> {
        let files = self.store.list().await?;
        let mut entries = Vec::with_capacity(files.len());
        for info in files {
            let url_count = match self.store.read(&info.filename).await {
                Ok(md) => extract_urls(&md).len(),
                Err(e) => {
                    warn!(file = %info.filename, error = %e, "could not read report");
                    0
                }
            };
            entries.push(ReportEntry { info, url_count });
        }
        Ok(entries)
    }

    pub async fn read_report(&self, filename: &str) -> Result<String, DomainError> {
        self.store.read(filename).await
    }

    pub async fn analyze_report(&self, filename: &str) -> Result<ReportAnalysis, DomainError> {
        let md = self.store.read(filename).await?;
        Ok(analyze(filename, &md))
    }

    pub async fn lint_report(&self, filename: &str) -> Result<LintReport, DomainError> {
        let md = self.store.read(filename).await?;
        Ok(lint(&md))
    }

    pub async fn delete_report(&self, filename: &str) -> Result<(), DomainError> {
        self.store.delete(filename).await
    }
}

fn story_from_hit(hit: &SearchHit) -> NewsStory {
    NewsStory {
        headline: hit.title.clone(),
        date: hit.published.clone(),
        summary: hit.snippet.clone(),
        source_url: Some(hit.url.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::adapters::market::DisabledMarketData;
    use crate::adapters::persistence::FsReportStore;
    use crate::adapters::search::MockSearchAdapter;
    use crate::domain::{ArticleDigest, NOT_AVAILABLE, Quote};
    use std::sync::Mutex;

    /// AI stub with scripted classifier and composer outcomes.
    struct ScriptedAi {
        verdict: fn() -> Result<TopicVerdict, DomainError>,
        composed: fn() -> Result<ComposedReport, DomainError>,
        seen_csv: Mutex<Option<String>>,
    }

    impl ScriptedAi {
        fn new(
            verdict: fn() -> Result<TopicVerdict, DomainError>,
            composed: fn() -> Result<ComposedReport, DomainError>,
        ) -> Self {
            Self {
                verdict,
                composed,
                seen_csv: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl AiPort for ScriptedAi {
        async fn classify_topic(&self, _topic: &str) -> Result<TopicVerdict, DomainError> {
            (self.verdict)()
        }
        async fn compose_report(
            &self,
            _topic: &str,
            context_csv: &str,
        ) -> Result<ComposedReport, DomainError> {
            *self.seen_csv.lock().unwrap() = Some(context_csv.to_string());
            (self.composed)()
        }
        async fn summarize_article(&self, _text: &str) -> Result<ArticleDigest, DomainError> {
            Err(DomainError::Ai("unused".into()))
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            Ok(vec![])
        }
    }

    fn finance() -> Result<TopicVerdict, DomainError> {
        Ok(TopicVerdict {
            is_finance: true,
            reason: "company".into(),
        })
    }

    /// Fixed hits: two whitelisted, one not, one duplicate. Fails queries containing "stock".
    struct FixedSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl SearchPort for FixedSearch {
        async fn search(
            &self,
            query: &str,
            _freshness_months: u32,
            _limit: usize,
        ) -> Result<Vec<SearchHit>, DomainError> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.contains("stock") {
                return Err(DomainError::Search("quota exceeded".into()));
            }
            let hit = |url: &str| SearchHit {
                title: format!("Title {}", url),
                url: url.to_string(),
                snippet: "snippet".into(),
                published: Some("2025-05-01".into()),
            };
            Ok(vec![
                hit("https://inc42.com/a"),
                hit("https://www.cnbc.com/b"),
                hit("https://spam.example/c"),
                hit("https://inc42.com/a"),
            ])
        }
    }

    struct FixedMarket(Result<Vec<Quote>, ()>);

    #[async_trait::async_trait]
    impl MarketDataPort for FixedMarket {
        async fn quotes(&self, _tickers: &[String]) -> Result<Vec<Quote>, DomainError> {
            self.0
                .clone()
                .map_err(|_| DomainError::Market("timeout".into()))
        }
    }

    fn settings() -> ReportSettings {
        ReportSettings {
            whitelist: vec!["inc42.com".into(), "cnbc.com".into()],
            ..Default::default()
        }
    }

    fn service(
        ai: Arc<dyn AiPort>,
        search: Arc<dyn SearchPort>,
        market: Arc<dyn MarketDataPort>,
        dir: &std::path::Path,
    ) -> ReportService {
        ReportService::new(
            ai,
            search,
            market,
            Arc::new(FsReportStore::new(dir)),
            settings(),
        )
    }

    #[test]
    fn test_decorate_query() {
        let wl = vec!["inc42.com".to_string(), "cnbc.com".to_string()];
        assert_eq!(
            decorate_query("Zoho news", &wl),
            "Zoho news site:inc42.com OR site:cnbc.com"
        );
        assert_eq!(
            decorate_query("Zoho site:CNBC.com", &wl),
            "Zoho site:CNBC.com"
        );
        assert_eq!(decorate_query("Zoho", &[]), "Zoho");
    }

    #[tokio::test]
    async fn test_generate_end_to_end_with_mocks() {
        let dir = tempfile::tempdir().unwrap();
        let svc = ReportService::new(
            Arc::new(MockAiAdapter::with_delay(0)),
            Arc::new(MockSearchAdapter::new()),
            Arc::new(DisabledMarketData),
            Arc::new(FsReportStore::new(dir.path())),
            ReportSettings {
                whitelist: vec!["inc42.com".into(), "yourstory.com".into()],
                ..Default::default()
            },
        );

        let out = svc.generate("  Sarvam AI ").await.unwrap();
        assert_eq!(out.topic, "Sarvam AI");
        assert!(out.session_id.starts_with("report_"));
        assert_eq!(out.session_id.len(), "report_".len() + 8);
        assert!(out.markdown_file.starts_with("finance_research_report_sarvam_ai_"));
        assert!(out.markdown_file.ends_with(&format!("{}.md", &out.session_id[7..])));
        assert!(out.lint.is_valid(), "{:?}", out.lint.issues);
        assert!(dir.path().join(&out.markdown_file).exists());

        // Only whitelisted domains survive
        assert!(!out.all_source_urls.is_empty());
        assert!(
            out.report
                .source_urls
                .iter()
                .all(|u| u.contains("inc42.com") || u.contains("yourstory.com"))
        );
        assert!(out.report.sourcing_notes.iter().any(|n| n
            == "Action: Sourced news from the following domains: inc42.com, yourstory.com."));
        assert!(out.markdown.starts_with("# Finance News Report: Sarvam AI"));
    }

    #[tokio::test]
    async fn test_rejected_topic() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(MockAiAdapter::with_delay(0)),
            Arc::new(MockSearchAdapter::new()),
            Arc::new(DisabledMarketData),
            dir.path(),
        );
        let err = svc.generate("chocolate cake recipe").await.unwrap_err();
        assert!(matches!(err, DomainError::TopicRejected { .. }));
        assert!(err.to_string().starts_with("Thanks, but we can only generate reports"));
        assert!(matches!(
            svc.generate(" ").await,
            Err(DomainError::InvalidTopic(_))
        ));
    }

    #[tokio::test]
    async fn test_classifier_failures_accept_topic() {
        let dir = tempfile::tempdir().unwrap();
        let parse_issue = service(
            Arc::new(ScriptedAi::new(
                || Err(DomainError::AiFormat("bad json".into())),
                || Ok(ComposedReport::default()),
            )),
            Arc::new(MockSearchAdapter::new()),
            Arc::new(DisabledMarketData),
            dir.path(),
        );
        assert_eq!(
            parse_issue.check_topic("Zoho").await.reason,
            ACCEPTED_ON_PARSE_ISSUE
        );

        let down = service(
            Arc::new(ScriptedAi::new(
                || Err(DomainError::Ai("503".into())),
                || Ok(ComposedReport::default()),
            )),
            Arc::new(MockSearchAdapter::new()),
            Arc::new(DisabledMarketData),
            dir.path(),
        );
        let verdict = down.check_topic("Zoho").await;
        assert!(verdict.is_finance);
        assert_eq!(verdict.reason, ACCEPTED_ON_SERVICE_ISSUE);
    }

    #[tokio::test]
    async fn test_search_filtering_and_failed_query() {
        let dir = tempfile::tempdir().unwrap();
        let ai = Arc::new(ScriptedAi::new(finance, || {
            Ok(ComposedReport {
                summary: "Summary".into(),
                stories: vec![NewsStory {
                    headline: "Story".into(),
                    summary: "s".into(),
                    source_url: Some("https://elsewhere.com/x".into()),
                    ..Default::default()
                }],
                financial_context: "ctx".into(),
            })
        }));
        let search = Arc::new(FixedSearch {
            queries: Mutex::new(vec![]),
        });
        let svc = service(ai.clone(), search.clone(), Arc::new(DisabledMarketData), dir.path());

        let out = svc.generate("Zoho").await.unwrap();

        let queries = search.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].ends_with("site:inc42.com OR site:cnbc.com"));

        let csv = ai.seen_csv.lock().unwrap().clone().unwrap();
        assert_eq!(csv.lines().count(), 3, "{csv}");
        assert!(!csv.contains("spam.example"));

        let notes = &out.report.sourcing_notes;
        assert!(notes.iter().any(|n| n.contains("failed: Search failed: quota exceeded")));
        assert!(notes.iter().any(|n| n == "Discarded 1 results from non-whitelisted domains."));
        assert!(notes.iter().any(|n| n.starts_with("1 of 1 stories cite a source")));
        assert!(notes.iter().any(|n| n
            == "Action: Sourced news from the following domains: inc42.com, www.cnbc.com."));

        assert_eq!(
            out.report.source_urls,
            vec![
                "https://inc42.com/a",
                "https://www.cnbc.com/b",
                "https://elsewhere.com/x"
            ]
        );
        assert_eq!(
            out.report.stories[0].source_domain.as_deref(),
            Some("elsewhere.com")
        );
        assert_eq!(
            out.report.stories[0].financial_context.as_deref(),
            Some(NO_FINANCIAL_DATA)
        );
    }

    #[tokio::test]
    async fn test_compose_failure_falls_back_to_hits() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(ScriptedAi::new(finance, || {
                Err(DomainError::Ai("timeout".into()))
            })),
            Arc::new(FixedSearch {
                queries: Mutex::new(vec![]),
            }),
            Arc::new(DisabledMarketData),
            dir.path(),
        );
        let out = svc.generate("Zoho").await.unwrap();
        assert_eq!(out.report.stories.len(), 2);
        assert!(out.report.summary.starts_with("Automated synthesis was unavailable"));
        assert!(out.lint.is_valid(), "{:?}", out.lint.issues);
        assert!(
            out.report
                .sourcing_notes
                .iter()
                .any(|n| n.starts_with("Automated synthesis failed"))
        );
    }

    fn with_tickers() -> Result<ComposedReport, DomainError> {
        Ok(ComposedReport {
            summary: "S".into(),
            stories: vec![
                NewsStory {
                    headline: "Nvidia".into(),
                    summary: "x".into(),
                    ticker: Some("nvda".into()),
                    source_url: Some("https://inc42.com/a".into()),
                    ..Default::default()
                },
                NewsStory {
                    headline: "Unknown".into(),
                    summary: "y".into(),
                    ticker: Some("ZZZZ".into()),
                    source_url: Some("https://www.cnbc.com/b".into()),
                    ..Default::default()
                },
                NewsStory {
                    headline: "Private".into(),
                    summary: "z".into(),
                    ticker: Some("N/A".into()),
                    ..Default::default()
                },
            ],
            financial_context: String::new(),
        })
    }

    #[tokio::test]
    async fn test_market_enrichment() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(ScriptedAi::new(finance, with_tickers)),
            Arc::new(FixedSearch {
                queries: Mutex::new(vec![]),
            }),
            Arc::new(FixedMarket(Ok(vec![Quote {
                symbol: "NVDA".into(),
                price: Some(950.0),
                change_percent: Some(1.5),
            }]))),
            dir.path(),
        );
        let out = svc.generate("Semiconductors").await.unwrap();
        let ctx: Vec<Option<&str>> = out
            .report
            .stories
            .iter()
            .map(|s| s.financial_context.as_deref())
            .collect();
        assert_eq!(
            ctx,
            vec![
                Some("$950.00 (+1.50%)"),
                Some(INVALID_TICKER),
                Some(NO_FINANCIAL_DATA)
            ]
        );
        assert_eq!(out.report.market_data.len(), 2);
        assert!(out.markdown.contains("- **NVDA:** $950.00 (+1.50%)"));
        // Story without URL renders the placeholder
        assert!(out.markdown.contains(&format!("  - **Source URL:** {}", NOT_AVAILABLE)));
    }

    #[tokio::test]
    async fn test_market_failure_marks_every_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(ScriptedAi::new(finance, with_tickers)),
            Arc::new(FixedSearch {
                queries: Mutex::new(vec![]),
            }),
            Arc::new(FixedMarket(Err(()))),
            dir.path(),
        );
        let out = svc.generate("Semiconductors").await.unwrap();
        assert!(
            out.report
                .market_data
                .iter()
                .all(|q| q.display == INVALID_TICKER)
        );
        assert!(
            out.report
                .sourcing_notes
                .iter()
                .any(|n| n.starts_with("Market data unavailable"))
        );
    }

    #[tokio::test]
    async fn test_library_operations() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Arc::new(MockAiAdapter::with_delay(0)),
            Arc::new(MockSearchAdapter::new()),
            Arc::new(DisabledMarketData),
            dir.path(),
        );
        let out = svc.generate("Zoho").await.unwrap();

        let listed = svc.list_reports().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].info.filename, out.markdown_file);
        assert_eq!(listed[0].url_count, out.all_source_urls.len());

        let analysis = svc.analyze_report(&out.markdown_file).await.unwrap();
        assert!(analysis.sections_present.values().all(|v| *v));
        assert!(svc.lint_report(&out.markdown_file).await.unwrap().is_valid());

        svc.delete_report(&out.markdown_file).await.unwrap();
        assert!(matches!(
            svc.read_report(&out.markdown_file).await,
            Err(DomainError::ReportNotFound(_))
        ));
    }
}
