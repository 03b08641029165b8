//! Search adapters. Implement SearchPort.

pub mod google_cse;
pub mod mock_search;

pub use google_cse::GoogleSearchAdapter;
pub use mock_search::MockSearchAdapter;
