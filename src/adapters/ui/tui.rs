//! Implements InputPort. Inquire-based interactive menu.
//!
//! Generate and inspect reports, run ingestion, query the article archive.

use super::progress;
use crate::domain::DomainError;
use crate::ports::InputPort;
use crate::usecases::{ArchiveQuery, IngestService, ReportService};
use async_trait::async_trait;
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{Confirm, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Neon prompt styling, applied globally to every inquire prompt.
pub fn apply_theme() {
    let mut config = RenderConfig::default_colored();
    config.prompt_prefix = Styled::new("›").with_fg(Color::LightMagenta);
    config.highlighted_option_prefix = Styled::new("▶").with_fg(Color::LightCyan);
    config.selected_option = Some(StyleSheet::new().with_fg(Color::LightCyan));
    config.answer = StyleSheet::new().with_fg(Color::LightGreen);
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Generate,
    List,
    Lint,
    Ingest,
    Query,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 6] = [
        MenuAction::Generate,
        MenuAction::List,
        MenuAction::Lint,
        MenuAction::Ingest,
        MenuAction::Query,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::Generate => "Generate report",
            MenuAction::List => "List reports",
            MenuAction::Lint => "Lint a report",
            MenuAction::Ingest => "Ingest news feeds",
            MenuAction::Query => "Query article archive",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Split a comma-separated answer into trimmed, non-empty items.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prompt result: `None` when the user pressed Esc / Ctrl-C.
fn answer<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::State(e.to_string())),
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    reports: Arc<ReportService>,
    ingest: Arc<IngestService>,
    archive: Arc<ArchiveQuery>,
}

impl TuiInputPort {
    pub fn new(
        reports: Arc<ReportService>,
        ingest: Arc<IngestService>,
        archive: Arc<ArchiveQuery>,
    ) -> Self {
        Self {
            reports,
            ingest,
            archive,
        }
    }

    async fn generate(&self) -> Result<(), DomainError> {
        let Some(topic) = answer(Text::new("Topic (company, sector, market):").prompt())? else {
            return Ok(());
        };
        let pb = progress::spinner(format!("Researching {}", topic.trim()));
        match self.reports.generate(&topic).await {
            Ok(out) => {
                progress::finish(&pb, format!("Saved {}", out.markdown_file));
                println!(
                    "  {} stories, {} source URLs, {} lint warnings",
                    out.report.stories.len(),
                    out.all_source_urls.len(),
                    out.lint.warning_count()
                );
                Ok(())
            }
            Err(e) => {
                pb.abandon_with_message("Generation failed");
                Err(e)
            }
        }
    }

    async fn list(&self) -> Result<(), DomainError> {
        let entries = self.reports.list_reports().await?;
        if entries.is_empty() {
            println!("  No reports yet.");
        }
        for e in entries {
            println!(
                "  {}  {:>7} B  {:>3} urls  {}",
                e.info.modified.format("%Y-%m-%d %H:%M"),
                e.info.size_bytes,
                e.url_count,
                e.info.filename
            );
        }
        Ok(())
    }

    async fn lint(&self) -> Result<(), DomainError> {
        let names: Vec<String> = self
            .reports
            .list_reports()
            .await?
            .into_iter()
            .map(|e| e.info.filename)
            .collect();
        if names.is_empty() {
            println!("  No reports to lint.");
            return Ok(());
        }
        let Some(name) = answer(Select::new("Report:", names).prompt())? else {
            return Ok(());
        };
        let lint = self.reports.lint_report(&name).await?;
        println!(
            "  {}: {} errors, {} warnings ({} stories, {} sources)",
            if lint.is_valid() { "VALID" } else { "INVALID" },
            lint.error_count(),
            lint.warning_count(),
            lint.story_count,
            lint.source_url_count
        );
        for issue in &lint.issues {
            let line = issue.line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string());
            println!("  line {:>4} {:?}: {}", line, issue.severity, issue.message);
        }
        Ok(())
    }

    async fn ingest(&self) -> Result<(), DomainError> {
        let confirmed = answer(
            Confirm::new("Crawl every configured source now?")
                .with_default(true)
                .prompt(),
        )?;
        if confirmed != Some(true) {
            return Ok(());
        }
        let pb = progress::spinner("Ingesting feeds");
        let stats = self.ingest.run(None).await;
        progress::finish(&pb, "Ingestion finished");
        for s in stats? {
            match &s.error {
                Some(err) => println!("  {:<16} failed: {}", s.source_id, err),
                None => println!(
                    "  {:<16} {} new, {} fetched, {} summarised, {} indexed",
                    s.source_id, s.new, s.fetched, s.summarised, s.indexed
                ),
            }
        }
        Ok(())
    }

    async fn query(&self) -> Result<(), DomainError> {
        let Some(tags) = answer(Text::new("Tags (all required, comma separated):").prompt())?
        else {
            return Ok(());
        };
        let Some(subtags) = answer(Text::new("Subtags (any, comma separated):").prompt())? else {
            return Ok(());
        };
        let paths = self
            .archive
            .find(&split_list(&tags), &split_list(&subtags))
            .await?;
        println!("  {} matching articles", paths.len());
        for p in paths {
            println!("  {}", p);
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let choice = answer(Select::new("What next?", MenuAction::ALL.to_vec()).prompt())?;
            let result = match choice.unwrap_or(MenuAction::Quit) {
                MenuAction::Generate => self.generate().await,
                MenuAction::List => self.list().await,
                MenuAction::Lint => self.lint().await,
                MenuAction::Ingest => self.ingest().await,
                MenuAction::Query => self.query().await,
                MenuAction::Quit => return Ok(()),
            };
            if let Err(e) = result {
                warn!(error = %e, "menu action failed");
                println!("  ✗ {}", e);
            }
        }
    }
}
