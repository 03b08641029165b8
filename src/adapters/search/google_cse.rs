//! Google Custom Search JSON API adapter.
//!
//! The freshness window maps to `dateRestrict=m<months>`. The API returns at most
//! 10 results per call, so larger limits are paged with `start`.

use crate::domain::{DomainError, SearchHit};
use crate::ports::SearchPort;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

const PAGE_SIZE: usize = 10;
/// The API refuses `start` beyond 91.
const MAX_START: usize = 91;

pub struct GoogleSearchAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleSearchAdapter {
    pub fn new(endpoint: String, api_key: String, engine_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            engine_id,
        }
    }

    async fn page(
        &self,
        query: &str,
        freshness_months: u32,
        start: usize,
        num: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let mut params: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("cx", self.engine_id.clone()),
            ("q", query.to_string()),
            ("num", num.to_string()),
            ("start", start.to_string()),
        ];
        if freshness_months > 0 {
            params.push(("dateRestrict", format!("m{}", freshness_months)));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| DomainError::Search(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text.chars().take(200).collect::<String>(), "search API returned error");
            return Err(DomainError::Search(format!("API error {}", status)));
        }

        let body: CseResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Search(format!("Failed to parse search response: {}", e)))?;
        Ok(body.items.into_iter().map(SearchHit::from).collect())
    }
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    pagemap: Option<Value>,
}

/// Publication date from the page's metatags, trimmed to `YYYY-MM-DD` when it is an ISO timestamp.
fn published_from_pagemap(pagemap: &Value) -> Option<String> {
    let tags = pagemap.get("metatags")?.as_array()?;
    tags.iter().find_map(|t| {
        ["article:published_time", "og:published_time", "datepublished", "date"]
            .iter()
            .find_map(|k| t.get(*k).and_then(Value::as_str))
            .map(|d| d.get(..10).filter(|p| p.as_bytes().get(4) == Some(&b'-')).unwrap_or(d).to_string())
    })
}

impl From<CseItem> for SearchHit {
    fn from(item: CseItem) -> Self {
        let published = item.pagemap.as_ref().and_then(published_from_pagemap);
        SearchHit {
            title: item.title,
            url: item.link,
            snippet: item.snippet.replace('\n', " "),
            published,
        }
    }
}

#[async_trait::async_trait]
impl SearchPort for GoogleSearchAdapter {
    async fn search(
        &self,
        query: &str,
        freshness_months: u32,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        info!(query, freshness_months, limit, "searching");
        let mut hits = Vec::new();
        let mut start = 1;
        while hits.len() < limit && start <= MAX_START {
            let num = (limit - hits.len()).min(PAGE_SIZE);
            let page = self.page(query, freshness_months, start, num).await?;
            let got = page.len();
            hits.extend(page);
            debug!(query, start, got, "search page");
            if got < num {
                break;
            }
            start += PAGE_SIZE;
        }
        hits.truncate(limit);
        Ok(hits)
    }
}
