//! AI adapter module. Implements AiPort for LLM integration.
//!
//! Provides OpenAI-compatible adapter and mock adapter for offline runs.

pub mod csv_utils;
pub mod mock_adapter;
pub mod openai_adapter;

pub use csv_utils::hits_to_csv;
pub use mock_adapter::MockAiAdapter;
pub use openai_adapter::OpenAiAdapter;
