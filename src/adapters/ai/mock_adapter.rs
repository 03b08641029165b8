//! Mock AI adapter for running without an API key.
//!
//! Deterministic answers derived from the input, so the whole pipeline can run
//! offline and tests can assert on the output.

use crate::domain::{ArticleDigest, ComposedReport, DomainError, NewsStory, TopicVerdict};
use crate::ports::AiPort;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;
use tracing::info;

/// Dimension of the hashed bag-of-words embedding.
const EMBEDDING_DIM: usize = 64;

/// Words that make the mock classifier reject a topic.
const NON_FINANCE_WORDS: &[&str] = &[
    "recipe", "cooking", "football", "cricket", "weather", "movie", "song", "poem", "gardening",
    "dating", "horoscope",
];

/// Mock AI adapter.
///
/// Returns predetermined responses without making API calls.
/// Simulates network latency with configurable delay.
pub struct MockAiAdapter {
    delay_ms: u64,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    async fn simulate_latency(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn words(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn classify_topic(&self, topic: &str) -> Result<TopicVerdict, DomainError> {
        info!(topic, "[MOCK] Simulating topic classification");
        self.simulate_latency().await;

        let hit = Self::words(topic).find(|w| NON_FINANCE_WORDS.contains(&w.as_str()));
        Ok(match hit {
            Some(word) => TopicVerdict {
                is_finance: false,
                reason: format!("[MOCK] '{}' is not a finance subject", word),
            },
            None => TopicVerdict {
                is_finance: true,
                reason: "[MOCK] Treated as a company or market topic".to_string(),
            },
        })
    }

    async fn compose_report(
        &self,
        topic: &str,
        context_csv: &str,
    ) -> Result<ComposedReport, DomainError> {
        info!(
            topic,
            csv_len = context_csv.len(),
            "[MOCK] Simulating report composition"
        );
        self.simulate_latency().await;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(context_csv.as_bytes());

        let mut stories = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DomainError::AiFormat(e.to_string()))?;
            let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());
            let Some(url) = field(2) else { continue };
            stories.push(NewsStory {
                headline: field(1).unwrap_or(topic).to_string(),
                date: field(0).map(str::to_string),
                summary: field(3).unwrap_or_default().to_string(),
                source_url: Some(url.to_string()),
                ..Default::default()
            });
        }

        Ok(ComposedReport {
            summary: format!(
                "[MOCK] Simulated overview of {} search results about {}. \
                 In production, the LLM would synthesise the key developments here.",
                stories.len(),
                topic
            ),
            stories,
            financial_context: format!("[MOCK] No market analysis for {} in offline mode.", topic),
        })
    }

    async fn summarize_article(&self, text: &str) -> Result<ArticleDigest, DomainError> {
        info!(text_len = text.len(), "[MOCK] Simulating article summarisation");
        self.simulate_latency().await;

        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::AiFormat("empty article".to_string()));
        }

        let title: String = text.lines().next().unwrap_or(text).chars().take(80).collect();
        let summary = text
            .split_inclusive(". ")
            .take(3)
            .collect::<String>()
            .trim()
            .to_string();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for w in Self::words(text).filter(|w| w.chars().count() >= 5) {
            *counts.entry(w).or_default() += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(ArticleDigest {
            title: title.trim().to_string(),
            summary,
            keywords: ranked.into_iter().take(5).map(|(w, _)| w).collect(),
        })
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| hashed_embedding(t)).collect())
    }
}

/// L2-normalised hashed bag-of-words vector. Identical word sets give identical vectors.
fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut v = vec![0f32; EMBEDDING_DIM];
    for word in MockAiAdapter::words(text) {
        let mut h = DefaultHasher::new();
        word.hash(&mut h);
        v[(h.finish() as usize) % EMBEDDING_DIM] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}
