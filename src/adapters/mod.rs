//! Infrastructure adapters. Implement ports.
//!
//! HTTP API, LLM, web search, market data, page fetching, filesystem/SQLite, terminal UI.
//! Map errors to DomainError.

pub mod ai;
pub mod http;
pub mod market;
pub mod persistence;
pub mod search;
pub mod ui;
pub mod web;
