use crate::usecases::ReportService;

/// Shared state for all handlers
pub struct AppState {
    pub reports: ReportService,
}

impl AppState {
    pub fn new(reports: ReportService) -> Self {
        Self { reports }
    }
}
