//! Application use cases. Orchestrate domain logic via ports.

pub mod archive_query;
pub mod ingest_service;
pub mod report_service;
pub mod summariser;
pub mod tagger;

pub use archive_query::ArchiveQuery;
pub use ingest_service::{IngestService, IngestStats};
pub use report_service::{GeneratedReport, ReportEntry, ReportService, ReportSettings};
pub use summariser::{Summariser, SummaryStats};
pub use tagger::Tagger;
