//! Application configuration. API credentials, endpoints, paths, tunables.
//!
//! Values come from `FIN_NEWS_*` environment variables (and `.env`), optionally
//! layered over a file named by `FIN_NEWS_CONFIG`.

use crate::domain::{DomainError, TagConfig};
use crate::usecases::ReportSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// News domains searched when no whitelist is configured.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "techcrunch.com",
    "venturebeat.com",
    "theverge.com",
    "technologyreview.com",
    "arstechnica.com",
    "cnbc.com",
    "bloomberg.com",
    "reuters.com",
    "marketwatch.com",
    "investor.com",
    "inc42.com",
    "entrackr.com",
    "yourstory.com",
    "vccircle.com",
    "indianstartupnews.com",
];

pub const DEFAULT_LLM_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_MARKET_ENDPOINT: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP bind address. Read from FIN_NEWS_HOST.
    #[serde(default)]
    pub host: Option<String>,
    /// HTTP port. Read from FIN_NEWS_PORT (also PORT).
    #[serde(default)]
    pub port: Option<u16>,

    /// Folder for generated reports. Read from FIN_NEWS_OUTPUT_DIR.
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Root of the ingestion data (ledger, articles, SQLite). Read from FIN_NEWS_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Feed catalog file. Defaults to `<data_dir>/sources.json`.
    #[serde(default)]
    pub sources_path: Option<String>,
    /// Tagging rules file. Defaults to `<data_dir>/tags.json`.
    #[serde(default)]
    pub tags_path: Option<String>,

    /// Comma-separated news domains. Read from FIN_NEWS_WHITELIST.
    #[serde(default)]
    pub whitelist: Option<String>,
    #[serde(default)]
    pub freshness_months: Option<u32>,
    #[serde(default)]
    pub results_per_query: Option<usize>,
    #[serde(default)]
    pub max_context_chars: Option<usize>,

    /// Parallel LLM calls / page fetches during ingestion.
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub fetch_retries: Option<u32>,

    // ─────────────────────────────────────────────────────────────────────────
    // LLM
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from FIN_NEWS_LLM_API_KEY, falling back to GOOGLE_API_KEY.
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub llm_api_url: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Embeddings endpoint. Derived from the chat URL when unset.
    #[serde(default)]
    pub embedding_url: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Search and market data
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from FIN_NEWS_SEARCH_API_KEY, falling back to GOOGLE_API_KEY.
    #[serde(default)]
    pub search_api_key: Option<String>,
    /// Programmable search engine id. Read from FIN_NEWS_SEARCH_ENGINE_ID.
    #[serde(default)]
    pub search_engine_id: Option<String>,
    #[serde(default)]
    pub search_endpoint: Option<String>,
    #[serde(default)]
    pub market_enabled: Option<bool>,
    #[serde(default)]
    pub market_endpoint: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("FIN_NEWS_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg = Self::from_builder(c, config::Environment::with_prefix("FIN_NEWS"))?;
        // PORT is honoured unprefixed for hosting platforms
        if cfg.port.is_none() {
            if let Some(port) = std::env::var("PORT").ok().and_then(|s| s.parse().ok()) {
                cfg.port = Some(port);
            }
        }
        Ok(cfg)
    }

    /// Environment values stay strings; numeric and boolean fields are parsed
    /// when the typed struct is deserialized, so ids like `0123` keep their text.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        builder.add_source(env).build()?.try_deserialize()
    }

    pub fn host_or_default(&self) -> String {
        self.host.clone().unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(5006)
    }

    pub fn output_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.output_dir.as_deref().unwrap_or("output"))
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or("data_new"))
    }

    pub fn sources_path_or_default(&self) -> PathBuf {
        self.sources_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir_or_default().join("sources.json"))
    }

    pub fn tags_path_or_default(&self) -> PathBuf {
        self.tags_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir_or_default().join("tags.json"))
    }

    /// Configured whitelist (comma or whitespace separated, lowercased), or the built-in list.
    pub fn whitelist_or_default(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .whitelist
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(|d| d.trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        if configured.is_empty() {
            DEFAULT_WHITELIST.iter().map(|d| d.to_string()).collect()
        } else {
            configured
        }
    }

    pub fn concurrency_or_default(&self) -> usize {
        self.concurrency.filter(|n| *n > 0).unwrap_or(5)
    }

    pub fn similarity_threshold_or_default(&self) -> f32 {
        self.similarity_threshold.unwrap_or(0.3)
    }

    pub fn fetch_timeout_secs_or_default(&self) -> u64 {
        self.fetch_timeout_secs.unwrap_or(30)
    }

    pub fn fetch_retries_or_default(&self) -> u32 {
        self.fetch_retries.unwrap_or(3)
    }

    pub fn report_settings(&self) -> ReportSettings {
        let defaults = ReportSettings::default();
        ReportSettings {
            whitelist: self.whitelist_or_default(),
            freshness_months: self
                .freshness_months
                .filter(|m| *m > 0)
                .unwrap_or(defaults.freshness_months),
            results_per_query: self
                .results_per_query
                .filter(|n| *n > 0)
                .unwrap_or(defaults.results_per_query),
            max_context_chars: self.max_context_chars.unwrap_or(defaults.max_context_chars),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // LLM helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// LLM key from config, or GOOGLE_API_KEY.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm_api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn llm_api_url_or_default(&self) -> String {
        self.llm_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string())
    }

    pub fn llm_model_or_default(&self) -> String {
        self.llm_model
            .clone()
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string())
    }

    pub fn embedding_model_or_default(&self) -> String {
        self.embedding_model
            .clone()
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string())
    }

    pub fn is_llm_configured(&self) -> bool {
        self.llm_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search / market helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Search key from config, or GOOGLE_API_KEY.
    pub fn search_api_key(&self) -> Option<String> {
        self.search_api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn search_endpoint_or_default(&self) -> String {
        self.search_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string())
    }

    /// Search needs both a key and an engine id.
    pub fn is_search_configured(&self) -> bool {
        self.search_api_key().is_some()
            && self
                .search_engine_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
    }

    pub fn is_market_enabled(&self) -> bool {
        self.market_enabled.unwrap_or(true)
    }

    pub fn market_endpoint_or_default(&self) -> String {
        self.market_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_MARKET_ENDPOINT.to_string())
    }
}

/// Read tagging rules from a JSON file. A missing file yields empty rules.
pub fn load_tag_config(path: &Path) -> Result<TagConfig, DomainError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .map_err(|e| DomainError::Config(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TagConfig::default()),
        Err(e) => Err(DomainError::Config(format!("{}: {}", path.display(), e))),
    }
}
