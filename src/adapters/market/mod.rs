//! Market data adapters. Implement MarketDataPort.

pub mod yahoo;

pub use yahoo::{DisabledMarketData, YahooQuoteAdapter};
