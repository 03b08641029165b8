//! Offline search adapter. Deterministic hits built from the query text.

use crate::domain::{DomainError, SearchHit, topic_slug};
use crate::ports::SearchPort;
use chrono::{Duration, Utc};
use tracing::info;

/// Domains the mock "finds" news on. The last one is outside any sensible whitelist.
const MOCK_DOMAINS: &[&str] = &[
    "inc42.com",
    "economictimes.indiatimes.com",
    "techcrunch.com",
    "yourstory.com",
    "randomblog.example",
];

#[derive(Default)]
pub struct MockSearchAdapter;

impl MockSearchAdapter {
    pub fn new() -> Self {
        Self
    }

    /// The query without `site:` filters and other operators.
    fn subject(query: &str) -> String {
        query
            .split_whitespace()
            .take_while(|w| !w.starts_with("site:") && *w != "OR")
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl SearchPort for MockSearchAdapter {
    async fn search(
        &self,
        query: &str,
        freshness_months: u32,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let subject = Self::subject(query);
        info!(query = %subject, freshness_months, "[MOCK] Simulating search");
        let slug = topic_slug(&subject).replace('_', "-");
        let today = Utc::now().date_naive();

        Ok(MOCK_DOMAINS
            .iter()
            .enumerate()
            .take(limit)
            .map(|(i, domain)| SearchHit {
                title: format!("[MOCK] {} update #{}", subject, i + 1),
                url: format!("https://{}/news/{}-{}", domain, slug, i + 1),
                snippet: format!("[MOCK] Simulated coverage of {} from {}.", subject, domain),
                published: Some((today - Duration::days(7 * (i as i64 + 1))).to_string()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_strips_operators() {
        let hits = MockSearchAdapter::new()
            .search("Zoho news site:inc42.com OR site:yourstory.com", 6, 3)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://inc42.com/news/zoho-news-1");
        assert!(hits[0].title.contains("Zoho news"));
        assert!(hits.iter().all(|h| h.published.is_some()));
    }
}
