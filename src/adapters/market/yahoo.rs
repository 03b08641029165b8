//! Yahoo Finance quote adapter.
//!
//! One batched request for all symbols. `regularMarketChangePercent` is already
//! expressed in percent and is used as-is.

use crate::domain::{DomainError, Quote};
use crate::ports::MarketDataPort;
use serde::Deserialize;
use tracing::{info, warn};

pub struct YahooQuoteAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl YahooQuoteAdapter {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(crate::adapters::web::http_fetcher::BROWSER_USER_AGENT)
                .build()
                .unwrap_or_default(),
            endpoint,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
}

impl From<YahooQuote> for Quote {
    fn from(q: YahooQuote) -> Self {
        Quote {
            symbol: q.symbol.to_uppercase(),
            price: q.regular_market_price,
            change_percent: q.regular_market_change_percent,
        }
    }
}

#[async_trait::async_trait]
impl MarketDataPort for YahooQuoteAdapter {
    async fn quotes(&self, tickers: &[String]) -> Result<Vec<Quote>, DomainError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }
        let symbols = tickers.join(",");
        info!(symbols = %symbols, "fetching market quotes");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("symbols", symbols.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::Market(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "quote API returned error");
            return Err(DomainError::Market(format!("API error {}", status)));
        }

        let envelope: QuoteEnvelope = response
            .json()
            .await
            .map_err(|e| DomainError::Market(format!("Failed to parse quote response: {}", e)))?;
        Ok(envelope
            .quote_response
            .result
            .into_iter()
            .map(Quote::from)
            .collect())
    }
}

/// Used when market data is switched off. Knows no symbols.
#[derive(Default)]
pub struct DisabledMarketData;

#[async_trait::async_trait]
impl MarketDataPort for DisabledMarketData {
    async fn quotes(&self, _tickers: &[String]) -> Result<Vec<Quote>, DomainError> {
        Ok(Vec::new())
    }
}
