use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::dto::*;
use super::error::ApiError;
use super::state::AppState;

/// GET / - Service description and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Finance News Report Generator API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Generate finance news reports with comprehensive URL tracking",
        "endpoints": {
            "POST /generate": "Generate a new finance news report",
            "GET /download/{filename}": "Download a generated report",
            "GET /list-reports": "List all generated reports",
            "GET /debug-report/{filename}": "Debug and analyze a report file",
            "GET /lint-report/{filename}": "Validate a report against the template",
            "DELETE /reports/{filename}": "Delete a report",
            "GET /health": "Health check"
        }
    }))
}

/// GET /health - Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /generate - Research a topic and write a report
pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(req) = payload?;
    let generated = state.reports.generate(&req.topic).await?;
    info!(
        session_id = %generated.session_id,
        file = %generated.markdown_file,
        urls = generated.all_source_urls.len(),
        "report served"
    );

    Ok(Json(GenerateResponse {
        download_url: format!("/download/{}", generated.markdown_file),
        markdown_file: generated.markdown_file,
        status: "completed",
        generated_at: generated.generated_at.to_rfc3339(),
        session_id: generated.session_id,
        topic: generated.topic,
        total_urls: generated.all_source_urls.len(),
        all_source_urls: generated.all_source_urls,
        report: generated.report,
    }))
}

/// GET /download/{filename} - Markdown file as an attachment
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.reports.read_report(&filename).await?;
    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// GET /list-reports - Stored reports, newest first
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListReportsResponse>, ApiError> {
    let reports: Vec<ReportListing> = state
        .reports
        .list_reports()
        .await?
        .into_iter()
        .map(ReportListing::from)
        .collect();

    Ok(Json(ListReportsResponse {
        status: "success",
        total_reports: reports.len(),
        reports,
    }))
}

/// GET /debug-report/{filename} - URL and section analysis
pub async fn debug_report(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DebugReportResponse>, ApiError> {
    let analysis = state.reports.analyze_report(&filename).await?;
    Ok(Json(DebugReportResponse {
        status: "success",
        total_url_count: analysis.total_urls_found,
        analysis,
    }))
}

/// GET /lint-report/{filename} - Template conformance
pub async fn lint_report(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<LintReportResponse>, ApiError> {
    let lint = state.reports.lint_report(&filename).await?;
    Ok(Json(LintReportResponse {
        status: "success",
        filename,
        valid: lint.is_valid(),
        errors: lint.error_count(),
        warnings: lint.warning_count(),
        lint,
    }))
}

/// DELETE /reports/{filename}
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.reports.delete_report(&filename).await?;
    info!(file = %filename, "report deleted");
    Ok(Json(DeleteResponse {
        status: "success",
        deleted: filename,
    }))
}
