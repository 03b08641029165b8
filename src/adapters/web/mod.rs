//! Web adapter: page fetching over HTTP.

pub mod http_fetcher;

pub use http_fetcher::{BROWSER_USER_AGENT, HttpFetcher};
