//! OpenAI-compatible adapter for the LLM port.
//!
//! Works with any chat-completions endpoint that speaks the OpenAI wire format.
//! Defaults target Gemini's compatibility endpoint. Implements `AiPort` with
//! robust JSON parsing and markdown stripping.

use crate::domain::{ArticleDigest, ComposedReport, DomainError, NewsStory, TopicVerdict};
use crate::ports::AiPort;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Longest article text sent for summarisation, in characters.
const MAX_ARTICLE_CHARS: usize = 12_000;

/// OpenAI-compatible AI adapter.
///
/// Can be configured to work with:
/// - Gemini (generativelanguage.googleapis.com/v1beta/openai)
/// - OpenAI API (api.openai.com)
/// - Ollama (localhost)
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    embeddings_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl OpenAiAdapter {
    /// Create a new adapter.
    ///
    /// # Arguments
    /// * `api_url` - Chat completions endpoint
    /// * `api_key` - API key (can be empty for local Ollama)
    /// * `model` - Chat model name (e.g., "gemini-2.5-flash")
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        let embeddings_url = Self::derive_embeddings_url(&api_url);
        Self {
            client: reqwest::Client::new(),
            api_url,
            embeddings_url,
            api_key,
            model,
            embedding_model: "text-embedding-004".to_string(),
        }
    }

    /// Override the embeddings endpoint and model.
    pub fn with_embeddings(mut self, url: Option<String>, model: String) -> Self {
        if let Some(url) = url {
            self.embeddings_url = url;
        }
        self.embedding_model = model;
        self
    }

    /// `.../chat/completions` -> `.../embeddings`.
    fn derive_embeddings_url(api_url: &str) -> String {
        match api_url.strip_suffix("chat/completions") {
            Some(base) => format!("{}embeddings", base),
            None => format!("{}/embeddings", api_url.trim_end_matches('/')),
        }
    }

    fn classify_prompt(topic: &str) -> String {
        format!(
            r#"You are a topic classifier. Determine if the following topic is finance-related.

Topic: "{}"

Finance-related topics include but are not limited to:
- Markets & Trading: stocks, cryptocurrencies, bonds, commodities, forex, derivatives
- Investments: portfolio management, mutual funds, ETFs, venture capital, private equity
- Banking & Credit: banking services, credit cards, loans, mortgages, lending
- Economics: inflation, interest rates, GDP, unemployment, fiscal and monetary policy
- Corporate Finance: mergers & acquisitions, IPOs, earnings, dividends, valuations
- Fintech & Blockchain: digital banking, financial apps, payment systems
- Insurance, Real Estate, Personal Finance
- Companies & Startups: any company name (e.g. 'Zoho', 'Apple', 'Tesla') is finance-related

Respond with ONLY a JSON object in this format:
{{"is_finance": true/false, "reason": "brief explanation"}}"#,
            topic
        )
    }

    fn compose_system_prompt() -> &'static str {
        r#"You are a financial news analyst writing a research report.

## Rules
- Use ONLY the search results provided (CSV: Date;Title;URL;Snippet). Never invent stories.
- Every story's source_url MUST be one of the URLs in the results.
- When a value cannot be established from the results, use null.
- Name the company and its stock ticker when the story concerns a listed company;
  otherwise set ticker to null.
- Prefer the most recent and most material developments: funding, earnings,
  acquisitions, partnerships, regulation, leadership changes.

## Output Format
You MUST respond with valid JSON only. No markdown, no explanations outside JSON.

```json
{
  "summary": "2-3 paragraph overview of the period",
  "financial_context": "Market position, valuation or funding background",
  "stories": [
    {
      "headline": "Short headline",
      "date": "YYYY-MM-DD or null",
      "summary": "2-3 sentences",
      "why_it_matters": "One sentence, or null",
      "company": "Company name or null",
      "ticker": "Ticker symbol or null",
      "source_url": "URL from the results"
    }
  ]
}
```"#
    }

    fn compose_user_prompt(topic: &str, context_csv: &str) -> String {
        format!(
            "Write the finance news report for the topic \"{}\" from these search results.\n\n{}",
            topic, context_csv
        )
    }

    fn summarize_prompt(text: &str) -> String {
        let text: String = text.chars().take(MAX_ARTICLE_CHARS).collect();
        format!(
            r#"Summarise the following news article.

Respond with ONLY a JSON object:
{{"title": "article title", "summary": "3-5 sentence factual summary", "keywords": ["keyword", "..."]}}

Keywords are 5-10 short terms: companies, people, places and topics.

Article:
{}"#,
            text
        )
    }

    /// Sanitize JSON response from LLM.
    ///
    /// LLMs sometimes wrap JSON in markdown code blocks. This strips them.
    fn sanitize_json(raw_text: &str) -> String {
        let trimmed = raw_text.trim();

        if trimmed.starts_with("```") {
            let without_prefix = trimmed
                .strip_prefix("```json")
                .or_else(|| trimmed.strip_prefix("```"))
                .unwrap_or(trimmed);

            if let Some(end_idx) = without_prefix.rfind("```") {
                return without_prefix[..end_idx].trim().to_string();
            }
            return without_prefix.trim().to_string();
        }

        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                return trimmed[start..=end].to_string();
            }
        }

        trimmed.to_string()
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, DomainError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Ai(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API returned error");
            return Err(DomainError::Ai(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::Ai(format!("Failed to parse API response: {}", e)))
    }

    /// One chat round-trip in JSON mode, decoded into `T`.
    async fn chat_json<T: DeserializeOwned>(
        &self,
        system: Option<&str>,
        user: String,
        temperature: f32,
    ) -> Result<T, DomainError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user,
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let chat_response: ChatResponse = self.post(&self.api_url, &request).await?;
        let raw_content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Ai("No response choices returned".to_string()))?;

        debug!(raw_len = raw_content.len(), "received AI response");

        let clean_json = Self::sanitize_json(&raw_content);
        serde_json::from_str(&clean_json).map_err(|e| {
            warn!(error = %e, json = %clean_json.chars().take(200).collect::<String>(), "JSON parse failed");
            DomainError::AiFormat(format!("Failed to parse LLM JSON: {}", e))
        })
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Parsed classifier answer. `is_finance` defaults to false like a missing key would.
#[derive(Deserialize)]
struct LlmVerdict {
    #[serde(default)]
    is_finance: bool,
    #[serde(default)]
    reason: String,
}

/// Parsed report composition (matches the JSON schema in the system prompt).
#[derive(Deserialize)]
struct LlmReport {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    financial_context: Option<String>,
    #[serde(default)]
    stories: Vec<LlmStory>,
}

#[derive(Deserialize)]
struct LlmStory {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    why_it_matters: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
}

/// `null`, empty strings and the literal "null" are all "no value".
fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

impl From<LlmStory> for NewsStory {
    fn from(s: LlmStory) -> Self {
        NewsStory {
            headline: clean(s.headline).unwrap_or_default(),
            date: clean(s.date),
            summary: clean(s.summary).unwrap_or_default(),
            why_it_matters: clean(s.why_it_matters),
            company: clean(s.company),
            ticker: clean(s.ticker),
            financial_context: None,
            source_domain: None,
            source_url: clean(s.source_url),
        }
    }
}

#[async_trait::async_trait]
impl AiPort for OpenAiAdapter {
    async fn classify_topic(&self, topic: &str) -> Result<TopicVerdict, DomainError> {
        info!(topic, "classifying topic");
        let verdict: LlmVerdict = self
            .chat_json(None, Self::classify_prompt(topic), 0.0)
            .await?;
        info!(topic, is_finance = verdict.is_finance, reason = %verdict.reason, "topic classified");
        Ok(TopicVerdict {
            is_finance: verdict.is_finance,
            reason: verdict.reason,
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
            "sending search context to AI for report composition"
        );

        let report: LlmReport = self
            .chat_json(
                Some(Self::compose_system_prompt()),
                Self::compose_user_prompt(topic, context_csv),
                0.3,
            )
            .await?;

        let stories: Vec<NewsStory> = report
            .stories
            .into_iter()
            .map(NewsStory::from)
            .filter(|s| !s.headline.is_empty() || !s.summary.is_empty())
            .collect();

        info!(topic, stories = stories.len(), "AI report composition complete");

        Ok(ComposedReport {
            summary: report.summary.trim().to_string(),
            stories,
            financial_context: clean(report.financial_context).unwrap_or_default(),
        })
    }

    async fn summarize_article(&self, text: &str) -> Result<ArticleDigest, DomainError> {
        debug!(text_len = text.len(), "summarising article");
        let digest: ArticleDigest = self
            .chat_json(None, Self::summarize_prompt(text), 0.3)
            .await?;
        if digest.summary.trim().is_empty() {
            return Err(DomainError::AiFormat("empty summary".to_string()));
        }
        Ok(digest)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let mut response: EmbeddingResponse = self.post(&self.embeddings_url, &request).await?;
        if response.data.len() != texts.len() {
            return Err(DomainError::AiFormat(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}
