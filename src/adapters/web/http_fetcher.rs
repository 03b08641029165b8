//! Implements WebPort over reqwest with retry and exponential backoff.

use crate::domain::DomainError;
use crate::ports::WebPort;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Browser-like User-Agent; several news sites refuse the reqwest default.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP page fetcher.
///
/// Retries rate limiting (429), service unavailable (503) and transport errors
/// with exponential backoff: `base_delay * 2^attempt`.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Web(format!("client build failed: {}", e)))?;
        Ok(Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
    }
}

#[async_trait::async_trait]
impl WebPort for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, DomainError> {
        let mut attempt = 0;
        loop {
            let last_error = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    let body = response
                        .text()
                        .await
                        .map_err(|e| DomainError::Web(format!("{}: {}", url, e)))?;
                    debug!(url, bytes = body.len(), attempt, "fetched");
                    return Ok(body);
                }
                Ok(response) if Self::is_retryable(response.status()) => {
                    format!("HTTP {}", response.status())
                }
                Ok(response) => {
                    return Err(DomainError::Web(format!(
                        "{}: HTTP {}",
                        url,
                        response.status()
                    )));
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(DomainError::Web(format!(
                    "{}: {} (after {} retries)",
                    url, last_error, attempt
                )));
            }
            let delay = self.backoff(attempt);
            warn!(url, attempt, error = %last_error, delay_ms = delay.as_millis() as u64, "fetch failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serve `/flaky` (503 twice, then 200) and `/gone` (404) on an ephemeral port.
    async fn spawn_server() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new()
            .route(
                "/flaky",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                            (AxumStatus::SERVICE_UNAVAILABLE, "busy")
                        } else {
                            (AxumStatus::OK, "hello")
                        }
                    }
                }),
            )
            .route("/gone", get(|| async { (AxumStatus::NOT_FOUND, "no") }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn test_retries_503_then_succeeds() {
        let (base, hits) = spawn_server().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 3)
            .unwrap()
            .with_base_delay(Duration::from_millis(1));
        let body = fetcher.fetch_text(&format!("{}/flaky", base)).await.unwrap();
        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (base, hits) = spawn_server().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 1)
            .unwrap()
            .with_base_delay(Duration::from_millis(1));
        assert!(fetcher.fetch_text(&format!("{}/flaky", base)).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (base, _) = spawn_server().await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 3)
            .unwrap()
            .with_base_delay(Duration::from_millis(1));
        let err = fetcher.fetch_text(&format!("{}/gone", base)).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_backoff_doubles() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1), 3)
            .unwrap()
            .with_base_delay(Duration::from_millis(100));
        assert_eq!(fetcher.backoff(0), Duration::from_millis(100));
        assert_eq!(fetcher.backoff(3), Duration::from_millis(800));
    }
}
