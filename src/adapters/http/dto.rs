use crate::domain::{LintReport, NewsReport, ReportAnalysis};
use crate::usecases::ReportEntry;
use serde::{Deserialize, Serialize};

/// POST /generate request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
}

/// POST /generate response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub report: NewsReport,
    pub markdown_file: String,
    pub download_url: String,
    pub status: &'static str,
    pub generated_at: String,
    pub session_id: String,
    pub topic: String,
    pub total_urls: usize,
    pub all_source_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportListing {
    #[serde(flatten)]
    pub entry: ReportEntry,
    pub download_url: String,
    pub debug_url: String,
}

impl From<ReportEntry> for ReportListing {
    fn from(entry: ReportEntry) -> Self {
        let name = entry.info.filename.clone();
        Self {
            entry,
            download_url: format!("/download/{}", name),
            debug_url: format!("/debug-report/{}", name),
        }
    }
}

/// GET /list-reports response
#[derive(Debug, Serialize)]
pub struct ListReportsResponse {
    pub status: &'static str,
    pub total_reports: usize,
    pub reports: Vec<ReportListing>,
}

/// GET /debug-report/{filename} response
#[derive(Debug, Serialize)]
pub struct DebugReportResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub analysis: ReportAnalysis,
    pub total_url_count: usize,
}

/// GET /lint-report/{filename} response
#[derive(Debug, Serialize)]
pub struct LintReportResponse {
    pub status: &'static str,
    pub filename: String,
    pub valid: bool,
    pub errors: usize,
    pub warnings: usize,
    #[serde(flatten)]
    pub lint: LintReport,
}

/// DELETE /reports/{filename} response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub deleted: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
