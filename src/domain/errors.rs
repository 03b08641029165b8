//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// The topic classifier decided the topic is not finance-related.
    #[error(
        "Thanks, but we can only generate reports on finance-related topics. '{topic}' doesn't appear to be finance-related. Reason: {reason}"
    )]
    TopicRejected { topic: String, reason: String },

    #[error("AI request failed: {0}")]
    Ai(String),

    /// The model answered, but not in the expected JSON shape.
    #[error("AI response could not be parsed: {0}")]
    AiFormat(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Market data error: {0}")]
    Market(String),

    #[error("Fetch failed: {0}")]
    Web(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("State error: {0}")]
    State(String),

    #[error("File '{0}' not found in output folder")]
    ReportNotFound(String),

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
