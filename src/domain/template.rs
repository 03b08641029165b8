//! The finance news report document: rendering, parsing and linting.
//!
//! Every report is a Markdown file with a fixed layout:
//!
//! ```text
//! # Finance News Report: <Topic>
//! ## Comprehensive Summary
//! ## Key News Stories        (or "## Key Developments")
//! ## Financial Context
//! ## Data Sourcing Notes
//! ## Source URLs             (numbered list)
//! ```
//!
//! The renderer always produces this layout; the parser and linter accept reports
//! written by other producers as long as they keep to it.

use super::entities::{NOT_AVAILABLE, NewsReport, NewsStory, normalize_ticker};
use super::urls::{extract_urls, is_http_url, unique_domains};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const TITLE_PREFIX: &str = "# Finance News Report: ";
pub const SUMMARY_HEADING: &str = "## Comprehensive Summary";
pub const STORIES_HEADING: &str = "## Key News Stories";
pub const STORIES_HEADING_ALT: &str = "## Key Developments";
pub const FINANCIAL_HEADING: &str = "## Financial Context";
pub const SOURCING_HEADING: &str = "## Data Sourcing Notes";
pub const SOURCES_HEADING: &str = "## Source URLs";

const PREVIEW_CHARS: usize = 1000;
const ANALYSIS_URL_LIMIT: usize = 20;

/// The five mandatory sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Stories,
    FinancialContext,
    SourcingNotes,
    SourceUrls,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Summary,
        Section::Stories,
        Section::FinancialContext,
        Section::SourcingNotes,
        Section::SourceUrls,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Section::Summary => SUMMARY_HEADING,
            Section::Stories => STORIES_HEADING,
            Section::FinancialContext => FINANCIAL_HEADING,
            Section::SourcingNotes => SOURCING_HEADING,
            Section::SourceUrls => SOURCES_HEADING,
        }
    }

    /// Map a `## ` heading line to a section (case-insensitive, trailing whitespace ignored).
    pub fn from_heading(line: &str) -> Option<Section> {
        let h = line.trim_end().to_ascii_lowercase();
        if h == SUMMARY_HEADING.to_ascii_lowercase() {
            Some(Section::Summary)
        } else if h == STORIES_HEADING.to_ascii_lowercase()
            || h == STORIES_HEADING_ALT.to_ascii_lowercase()
        {
            Some(Section::Stories)
        } else if h == FINANCIAL_HEADING.to_ascii_lowercase() {
            Some(Section::FinancialContext)
        } else if h == SOURCING_HEADING.to_ascii_lowercase() {
            Some(Section::SourcingNotes)
        } else if h == SOURCES_HEADING.to_ascii_lowercase() {
            Some(Section::SourceUrls)
        } else {
            None
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading().trim_start_matches("## "))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn or_not_available(v: Option<&str>) -> String {
    match v.map(str::trim) {
        Some(s) if !s.is_empty() => one_line(s),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Multi-line model text with every heading demoted to `### `, so it cannot open a
/// new top-level section.
fn free_text(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    s.lines()
        .map(|line| {
            let t = line.trim_start();
            let rest = t.trim_start_matches('#');
            if rest.len() < t.len() && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
                format!("### {}", rest.trim())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a report to the six-section Markdown layout.
pub fn render_markdown(report: &NewsReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("{}{}\n\n", TITLE_PREFIX, one_line(&report.topic)));
    md.push_str(&format!(
        "*Generated {} | {} stories, {} sources*\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.stories.len(),
        report.source_urls.len()
    ));

    md.push_str(SUMMARY_HEADING);
    md.push_str("\n\n");
    md.push_str(&free_text(&report.summary));
    md.push_str("\n\n");

    md.push_str(STORIES_HEADING);
    md.push_str("\n\n");
    if report.stories.is_empty() {
        md.push_str("No qualifying news stories were found for this period.\n");
    }
    for story in &report.stories {
        render_story(&mut md, story);
    }
    md.push('\n');

    md.push_str(FINANCIAL_HEADING);
    md.push_str("\n\n");
    md.push_str(&free_text(&report.financial_context));
    md.push_str("\n\n");
    for q in &report.market_data {
        md.push_str(&format!("- **{}:** {}\n", q.ticker, one_line(&q.display)));
    }
    if !report.market_data.is_empty() {
        md.push('\n');
    }

    md.push_str(SOURCING_HEADING);
    md.push_str("\n\n");
    if report.sourcing_notes.is_empty() {
        md.push_str(&format!("- {}\n", NOT_AVAILABLE));
    }
    for note in &report.sourcing_notes {
        md.push_str(&format!("- {}\n", one_line(note)));
    }
    md.push('\n');

    md.push_str(SOURCES_HEADING);
    md.push_str("\n\n");
    for (i, url) in report.source_urls.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, url.trim()));
    }

    md
}

fn render_story(md: &mut String, story: &NewsStory) {
    let headline = one_line(&story.headline);
    let headline = if headline.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        headline
    };
    md.push_str(&format!("- **{}**\n", headline));
    md.push_str(&format!(
        "  - **Date:** {}\n",
        or_not_available(story.date.as_deref())
    ));
    md.push_str(&format!(
        "  - **Summary:** {}\n",
        or_not_available(Some(&story.summary))
    ));
    if let Some(why) = story.why_it_matters.as_deref().filter(|s| !s.trim().is_empty()) {
        md.push_str(&format!("  - **Why It Matters:** {}\n", one_line(why)));
    }
    if let Some(company) = story.company.as_deref().filter(|s| !s.trim().is_empty()) {
        match story.ticker.as_deref().and_then(normalize_ticker) {
            Some(t) => md.push_str(&format!("  - **Company:** {} ({})\n", one_line(company), t)),
            None => md.push_str(&format!("  - **Company:** {}\n", one_line(company))),
        }
    }
    if let Some(ctx) = story
        .financial_context
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        md.push_str(&format!("  - **Market Data:** {}\n", one_line(ctx)));
    }
    md.push_str(&format!(
        "  - **Source URL:** {}\n",
        or_not_available(story.source_url.as_deref())
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// A `## ` block of the document. `line` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct SectionBlock {
    pub heading: String,
    pub section: Option<Section>,
    pub line: usize,
    pub body: Vec<(usize, String)>,
}

impl SectionBlock {
    fn text(&self) -> String {
        self.body
            .iter()
            .map(|(_, l)| l.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Story as read back from Markdown. Field values are raw text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStory {
    pub headline: String,
    pub line: usize,
    pub date: Option<String>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub why_it_matters: Option<String>,
    pub company: Option<String>,
    pub market_data: Option<String>,
}

/// One entry of the Source URLs list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub line: usize,
    /// Number in front of the entry, `None` for a bullet or bare line.
    pub number: Option<u32>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedReport {
    /// Line number of the first non-empty line, with the text that follows the title prefix.
    pub title: Option<(usize, String)>,
    pub topic: Option<String>,
    pub sections: Vec<SectionBlock>,
    pub stories: Vec<ParsedStory>,
    pub sources: Vec<SourceEntry>,
}

impl ParsedReport {
    pub fn source_urls(&self) -> Vec<String> {
        self.sources.iter().filter_map(|s| s.url.clone()).collect()
    }

    fn first(&self, section: Section) -> Option<&SectionBlock> {
        self.sections.iter().find(|b| b.section == Some(section))
    }
}

enum StoryField {
    Date,
    Summary,
    SourceUrl,
    WhyItMatters,
    Company,
    MarketData,
}

/// `- **Key:** value`, `- Key: value` or `**Key:** value` → (field, value).
fn parse_field(line: &str) -> Option<(StoryField, String)> {
    let t = line.trim_start();
    let t = t
        .strip_prefix("- ")
        .or_else(|| t.strip_prefix("* "))
        .unwrap_or(t)
        .trim_start();
    let (key, value) = if let Some(rest) = t.strip_prefix("**") {
        let end = rest.find("**")?;
        let key = rest[..end].trim().trim_end_matches(':').trim();
        let value = rest[end + 2..].trim_start().trim_start_matches(':').trim();
        (key.to_string(), value.to_string())
    } else {
        let (key, value) = t.split_once(':')?;
        (key.trim().to_string(), value.trim().to_string())
    };
    let field = match key.to_ascii_lowercase().as_str() {
        "date" | "published" | "publication date" => StoryField::Date,
        "summary" => StoryField::Summary,
        "source url" | "source" | "url" => StoryField::SourceUrl,
        "why it matters" => StoryField::WhyItMatters,
        "company" => StoryField::Company,
        "market data" | "financial context" => StoryField::MarketData,
        _ => return None,
    };
    Some((field, value))
}

fn strip_emphasis(s: &str) -> String {
    s.trim().trim_matches('*').trim().to_string()
}

fn parse_stories(block: &SectionBlock) -> Vec<ParsedStory> {
    let mut stories: Vec<ParsedStory> = Vec::new();
    // Under a `### ` headline the fields are top-level bullets.
    let mut heading_style = false;
    for (line_no, line) in &block.body {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(h) = line.strip_prefix("### ") {
            stories.push(ParsedStory {
                headline: strip_emphasis(h),
                line: *line_no,
                ..Default::default()
            });
            heading_style = true;
            continue;
        }
        let trimmed = line.trim_start();
        let is_bullet = trimmed.starts_with("- ") || trimmed.starts_with("* ");
        let indented = line.len() != trimmed.len();
        let may_be_field = indented || !is_bullet || heading_style;
        if let (Some(story), Some((field, value)), true) =
            (stories.last_mut(), parse_field(line), may_be_field)
        {
            let slot = match field {
                StoryField::Date => &mut story.date,
                StoryField::Summary => &mut story.summary,
                StoryField::SourceUrl => &mut story.source_url,
                StoryField::WhyItMatters => &mut story.why_it_matters,
                StoryField::Company => &mut story.company,
                StoryField::MarketData => &mut story.market_data,
            };
            *slot = Some(value);
            continue;
        }
        if is_bullet && !indented {
            stories.push(ParsedStory {
                headline: strip_emphasis(&trimmed[2..]),
                line: *line_no,
                ..Default::default()
            });
            heading_style = false;
        }
    }
    stories
}

fn parse_sources(block: &SectionBlock) -> Vec<SourceEntry> {
    block
        .body
        .iter()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(line_no, l)| {
            let t = l.trim();
            let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
            let number = if !digits.is_empty() && t[digits.len()..].starts_with(". ") {
                digits.parse().ok()
            } else {
                None
            };
            SourceEntry {
                line: *line_no,
                number,
                url: extract_urls(t).into_iter().next(),
            }
        })
        .collect()
}

/// Split a report into title, sections, stories and source entries.
pub fn parse_markdown(md: &str) -> ParsedReport {
    let mut title = None;
    let mut started = false;
    let mut sections: Vec<SectionBlock> = Vec::new();

    for (idx, line) in md.lines().enumerate() {
        let line_no = idx + 1;
        if !started {
            if line.trim().is_empty() {
                continue;
            }
            started = true;
            if line.starts_with("# ") {
                title = Some((line_no, line.trim_end().to_string()));
                continue;
            }
        }
        if line.starts_with("## ") {
            sections.push(SectionBlock {
                heading: line.trim_end().to_string(),
                section: Section::from_heading(line),
                line: line_no,
                body: Vec::new(),
            });
        } else if let Some(block) = sections.last_mut() {
            block.body.push((line_no, line.to_string()));
        }
    }

    let topic = title.as_ref().and_then(|(_, t)| {
        t.strip_prefix(TITLE_PREFIX.trim_end())
            .map(|rest| rest.trim().to_string())
    });

    let mut parsed = ParsedReport {
        title,
        topic,
        sections,
        stories: Vec::new(),
        sources: Vec::new(),
    };
    if let Some(block) = parsed.first(Section::Stories) {
        parsed.stories = parse_stories(block);
    }
    if let Some(block) = parsed.first(Section::SourceUrls) {
        parsed.sources = parse_sources(block);
    }
    parsed
}

// ─────────────────────────────────────────────────────────────────────────────
// Linting
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum LintRule {
    MissingTitle,
    EmptyTopic,
    MissingSection { section: Section },
    DuplicateSection { section: Section },
    SectionOutOfOrder { section: Section },
    EmptySection { section: Section },
    StoryMissingField { story: usize, field: &'static str },
    StoryInvalidUrl { story: usize, value: String },
    SourceNotNumbered,
    SourceNumbering { expected: u32, found: u32 },
    SourceMissingUrl,
    NoStories,
    EmptySourceList,
    UnlistedStoryUrl { story: usize, url: String },
}

impl LintRule {
    pub fn severity(&self) -> Severity {
        match self {
            LintRule::NoStories | LintRule::EmptySourceList | LintRule::UnlistedStoryUrl { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for LintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintRule::MissingTitle => write!(f, "first line must start with '{}'", TITLE_PREFIX.trim_end()),
            LintRule::EmptyTopic => write!(f, "title has no topic"),
            LintRule::MissingSection { section } => write!(f, "missing section '{}'", section.heading()),
            LintRule::DuplicateSection { section } => write!(f, "section '{}' appears more than once", section.heading()),
            LintRule::SectionOutOfOrder { section } => write!(f, "section '{}' is out of order", section.heading()),
            LintRule::EmptySection { section } => write!(f, "section '{}' is empty", section.heading()),
            LintRule::StoryMissingField { story, field } => write!(f, "story {} has no '{}' field", story, field),
            LintRule::StoryInvalidUrl { story, value } => write!(f, "story {} source URL '{}' is not a URL or '{}'", story, value, NOT_AVAILABLE),
            LintRule::SourceNotNumbered => write!(f, "source entry is not a numbered list item"),
            LintRule::SourceNumbering { expected, found } => write!(f, "source numbered {} where {} was expected", found, expected),
            LintRule::SourceMissingUrl => write!(f, "source entry has no URL"),
            LintRule::NoStories => write!(f, "report lists no stories"),
            LintRule::EmptySourceList => write!(f, "source URL list is empty"),
            LintRule::UnlistedStoryUrl { story, url } => write!(f, "story {} URL {} is missing from the source list", story, url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintIssue {
    pub line: Option<usize>,
    pub severity: Severity,
    #[serde(flatten)]
    pub rule: LintRule,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub issues: Vec<LintIssue>,
    pub story_count: usize,
    pub source_url_count: usize,
}

impl LintReport {
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }
}

fn issue(line: Option<usize>, rule: LintRule) -> LintIssue {
    LintIssue {
        line,
        severity: rule.severity(),
        message: rule.to_string(),
        rule,
    }
}

/// Check a Markdown document against the report layout.
pub fn lint(md: &str) -> LintReport {
    let parsed = parse_markdown(md);
    let mut issues = Vec::new();

    match (&parsed.title, &parsed.topic) {
        (None, _) | (Some(_), None) => {
            issues.push(issue(parsed.title.as_ref().map(|(l, _)| *l), LintRule::MissingTitle))
        }
        (Some((line, _)), Some(topic)) if topic.is_empty() => {
            issues.push(issue(Some(*line), LintRule::EmptyTopic))
        }
        _ => {}
    }

    let mut last_order: Option<Section> = None;
    let mut seen = HashSet::new();
    for block in &parsed.sections {
        let Some(section) = block.section else { continue };
        if !seen.insert(section) {
            issues.push(issue(Some(block.line), LintRule::DuplicateSection { section }));
            continue;
        }
        if last_order.is_some_and(|prev| section < prev) {
            issues.push(issue(Some(block.line), LintRule::SectionOutOfOrder { section }));
        }
        last_order = Some(last_order.map_or(section, |prev| prev.max(section)));
    }
    for section in Section::ALL {
        if !seen.contains(&section) {
            issues.push(issue(None, LintRule::MissingSection { section }));
        }
    }

    if let Some(block) = parsed.first(Section::Summary) {
        if block.text().trim().is_empty() {
            issues.push(issue(
                Some(block.line),
                LintRule::EmptySection {
                    section: Section::Summary,
                },
            ));
        }
    }

    let listed: HashSet<String> = parsed.source_urls().into_iter().collect();
    if let Some(block) = parsed.first(Section::Stories) {
        if parsed.stories.is_empty() {
            issues.push(issue(Some(block.line), LintRule::NoStories));
        }
    }
    for (i, story) in parsed.stories.iter().enumerate() {
        let n = i + 1;
        let line = Some(story.line);
        for (value, field) in [
            (&story.date, "Date"),
            (&story.summary, "Summary"),
            (&story.source_url, "Source URL"),
        ] {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                issues.push(issue(line, LintRule::StoryMissingField { story: n, field }));
            }
        }
        if let Some(raw) = story.source_url.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let url = extract_urls(raw).into_iter().next();
            match url {
                Some(url) if is_http_url(&url) => {
                    if parsed.first(Section::SourceUrls).is_some() && !listed.contains(&url) {
                        issues.push(issue(line, LintRule::UnlistedStoryUrl { story: n, url }));
                    }
                }
                _ if raw.eq_ignore_ascii_case(NOT_AVAILABLE) => {}
                _ => issues.push(issue(
                    line,
                    LintRule::StoryInvalidUrl {
                        story: n,
                        value: raw.to_string(),
                    },
                )),
            }
        }
    }

    if let Some(block) = parsed.first(Section::SourceUrls) {
        if parsed.sources.is_empty() {
            issues.push(issue(Some(block.line), LintRule::EmptySourceList));
        }
        let mut expected = 1u32;
        for entry in &parsed.sources {
            match entry.number {
                None => issues.push(issue(Some(entry.line), LintRule::SourceNotNumbered)),
                Some(found) if found != expected => {
                    issues.push(issue(
                        Some(entry.line),
                        LintRule::SourceNumbering { expected, found },
                    ));
                    expected = found.saturating_add(1);
                }
                Some(_) => expected = expected.saturating_add(1),
            }
            if entry.url.is_none() {
                issues.push(issue(Some(entry.line), LintRule::SourceMissingUrl));
            }
        }
    }

    issues.sort_by_key(|i| i.line.unwrap_or(usize::MAX));
    LintReport {
        story_count: parsed.stories.len(),
        source_url_count: parsed.sources.iter().filter(|s| s.url.is_some()).count(),
        issues,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis (debug view)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReportAnalysis {
    pub filename: String,
    pub file_size_bytes: usize,
    pub line_count: usize,
    pub total_urls_found: usize,
    pub unique_domains: Vec<String>,
    pub sections_present: BTreeMap<&'static str, bool>,
    pub urls: Vec<String>,
    pub report_preview: String,
}

/// Quick structural summary of a stored report, tolerant of malformed documents.
pub fn analyze(filename: &str, md: &str) -> ReportAnalysis {
    let urls = extract_urls(md);
    let lower = md.to_lowercase();
    let has = |heading: &str| lower.contains(&heading.to_lowercase());

    let mut sections_present = BTreeMap::new();
    sections_present.insert(
        "has_title",
        md.trim_start().starts_with("# ") || md.contains(TITLE_PREFIX.trim_end()),
    );
    sections_present.insert("has_summary", has(SUMMARY_HEADING));
    sections_present.insert("has_stories", has(STORIES_HEADING) || has(STORIES_HEADING_ALT));
    sections_present.insert("has_financial_context", has(FINANCIAL_HEADING));
    sections_present.insert("has_data_sourcing", has(SOURCING_HEADING));
    sections_present.insert("has_source_urls", has(SOURCES_HEADING));

    let report_preview = if md.chars().count() > PREVIEW_CHARS {
        format!("{}...", md.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        md.to_string()
    };

    ReportAnalysis {
        filename: filename.to_string(),
        file_size_bytes: md.len(),
        line_count: md.matches('\n').count(),
        total_urls_found: urls.len(),
        unique_domains: unique_domains(&urls),
        sections_present,
        urls: urls.into_iter().take(ANALYSIS_URL_LIMIT).collect(),
        report_preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TickerQuote;
    use chrono::{TimeZone, Utc};

    fn sample_report() -> NewsReport {
        NewsReport {
            topic: "Sarvam AI".into(),
            title: NewsReport::title_for("Sarvam AI"),
            summary: "Sarvam AI was selected under the IndiaAI Mission to build a sovereign LLM."
                .into(),
            stories: vec![
                NewsStory {
                    headline: "Sarvam AI picked for IndiaAI Mission".into(),
                    date: Some("2025-04-26".into()),
                    summary: "The government selected Sarvam AI\nto build a foundation model."
                        .into(),
                    why_it_matters: Some("First startup chosen under the mission.".into()),
                    company: Some("Sarvam AI".into()),
                    ticker: Some("N/A".into()),
                    financial_context: Some("No financial data".into()),
                    source_domain: Some("inc42.com".into()),
                    source_url: Some("https://inc42.com/buzz/sarvam-indiaai/".into()),
                },
                NewsStory {
                    headline: "GenAI funding round".into(),
                    date: None,
                    summary: "Series A extension reported.".into(),
                    source_url: None,
                    ..Default::default()
                },
            ],
            financial_context: "Sarvam AI is privately held; no public market data.".into(),
            market_data: vec![TickerQuote {
                ticker: "NVDA".into(),
                display: "$950.00 (+1.50%)".into(),
            }],
            sourcing_notes: vec![
                "Action: Sourced news from the following domains: inc42.com.".into(),
            ],
            source_urls: vec![
                "https://inc42.com/buzz/sarvam-indiaai/".into(),
                "https://yourstory.com/2025/05/sarvam".into(),
            ],
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_contains_all_sections_in_order() {
        let md = render_markdown(&sample_report());
        assert!(md.starts_with("# Finance News Report: Sarvam AI\n"));
        let positions: Vec<usize> = Section::ALL
            .iter()
            .map(|s| md.find(s.heading()).expect("section rendered"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(md.contains("  - **Date:** Not Available"));
        assert!(md.contains("  - **Source URL:** Not Available"));
        assert!(md.contains("The government selected Sarvam AI to build a foundation model."));
        assert!(md.contains("  - **Company:** Sarvam AI\n"));
        assert!(md.contains("- **NVDA:** $950.00 (+1.50%)"));
        assert!(md.contains("1. https://inc42.com/buzz/sarvam-indiaai/\n2. https://yourstory.com/2025/05/sarvam\n"));
    }

    #[test]
    fn test_rendered_report_lints_clean() {
        let md = render_markdown(&sample_report());
        let report = lint(&md);
        assert!(report.is_valid(), "{:?}", report.issues);
        assert_eq!(report.warning_count(), 0, "{:?}", report.issues);
        assert_eq!(report.story_count, 2);
        assert_eq!(report.source_url_count, 2);
    }

    #[test]
    fn test_parse_rendered_report() {
        let md = render_markdown(&sample_report());
        let parsed = parse_markdown(&md);
        assert_eq!(parsed.topic.as_deref(), Some("Sarvam AI"));
        assert_eq!(parsed.stories.len(), 2);
        let first = &parsed.stories[0];
        assert_eq!(first.headline, "Sarvam AI picked for IndiaAI Mission");
        assert_eq!(first.date.as_deref(), Some("2025-04-26"));
        assert_eq!(
            first.source_url.as_deref(),
            Some("https://inc42.com/buzz/sarvam-indiaai/")
        );
        assert_eq!(
            first.why_it_matters.as_deref(),
            Some("First startup chosen under the mission.")
        );
        assert_eq!(parsed.stories[1].date.as_deref(), Some(NOT_AVAILABLE));
        assert_eq!(parsed.source_urls().len(), 2);
    }

    #[test]
    fn test_parse_heading_style_stories() {
        let md = "# Finance News Report: Zoho\n\n\
                  ## Comprehensive Summary\n\nZoho expanded.\n\n\
                  ## Key Developments\n\n\
                  ### 1. Zoho launches Arattai\n\
                  - **Date:** 2025-09-20\n\
                  - **Summary:** Messaging app surge.\n\
                  - **Source URL:** https://entrackr.com/zoho\n\n\
                  ## Financial Context\n\nPrivately held.\n\n\
                  ## Data Sourcing Notes\n\n- Search restricted.\n\n\
                  ## Source URLs\n\n1. https://entrackr.com/zoho\n";
        let report = lint(md);
        assert!(report.is_valid(), "{:?}", report.issues);
        assert_eq!(report.story_count, 1);
        let parsed = parse_markdown(md);
        assert_eq!(parsed.stories[0].headline, "1. Zoho launches Arattai");
    }

    #[test]
    fn test_lint_detects_structural_problems() {
        let md = "Some preface\n\n\
                  ## Financial Context\n\nN/A\n\n\
                  ## Comprehensive Summary\n\n\n\
                  ## Key News Stories\n\n\
                  - **Deal announced**\n  - **Summary:** Something.\n  - **Source URL:** see below\n\n\
                  ## Source URLs\n\n1. https://a.example.com/x\n3. https://b.example.com/y\n- not numbered\n";
        let report = lint(md);
        let rules: Vec<&LintRule> = report.issues.iter().map(|i| &i.rule).collect();

        assert!(rules.contains(&&LintRule::MissingTitle));
        assert!(rules.contains(&&LintRule::MissingSection {
            section: Section::SourcingNotes
        }));
        assert!(rules.contains(&&LintRule::SectionOutOfOrder {
            section: Section::Summary
        }));
        assert!(rules.contains(&&LintRule::EmptySection {
            section: Section::Summary
        }));
        assert!(rules.contains(&&LintRule::StoryMissingField {
            story: 1,
            field: "Date"
        }));
        assert!(rules.contains(&&LintRule::StoryInvalidUrl {
            story: 1,
            value: "see below".into()
        }));
        assert!(rules.contains(&&LintRule::SourceNumbering {
            expected: 2,
            found: 3
        }));
        assert!(rules.contains(&&LintRule::SourceNotNumbered));
        assert!(rules.contains(&&LintRule::SourceMissingUrl));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_lint_warnings_only() {
        let md = "# Finance News Report: Acme\n\n\
                  ## Comprehensive Summary\n\nQuiet period.\n\n\
                  ## Key News Stories\n\nNo qualifying news stories were found for this period.\n\n\
                  ## Financial Context\n\nNot Available\n\n\
                  ## Data Sourcing Notes\n\n- none\n\n\
                  ## Source URLs\n\n";
        let report = lint(md);
        assert!(report.is_valid());
        let rules: Vec<&LintRule> = report.issues.iter().map(|i| &i.rule).collect();
        assert_eq!(rules, vec![&LintRule::NoStories, &LintRule::EmptySourceList]);
    }

    #[test]
    fn test_lint_duplicate_and_unlisted() {
        let md = "# Finance News Report: Acme\n\n\
                  ## Comprehensive Summary\n\nText.\n\n\
                  ## Key News Stories\n\n\
                  - **A**\n  - **Date:** 2025-01-01\n  - **Summary:** s\n  - **Source URL:** https://x.example.com/a\n\n\
                  ## Financial Context\n\nx\n\n\
                  ## Data Sourcing Notes\n\n- n\n\n\
                  ## Data Sourcing Notes\n\n- again\n\n\
                  ## Source URLs\n\n1. https://y.example.com/b\n";
        let report = lint(md);
        let rules: Vec<&LintRule> = report.issues.iter().map(|i| &i.rule).collect();
        assert!(rules.contains(&&LintRule::DuplicateSection {
            section: Section::SourcingNotes
        }));
        assert!(rules.contains(&&LintRule::UnlistedStoryUrl {
            story: 1,
            url: "https://x.example.com/a".into()
        }));
    }

    #[test]
    fn test_headings_in_free_text_are_demoted() {
        let mut r = sample_report();
        r.summary = "Overview.\n\n## Source URLs\n\nsee below\n# Finance News Report: Other".into();
        r.financial_context = "## Key Metrics\n  ### Revenue\n#hashtag stays".into();
        let md = render_markdown(&r);
        assert!(md.contains("### Source URLs\n"));
        assert!(md.contains("### Key Metrics\n### Revenue\n#hashtag stays"));
        assert_eq!(md.matches(&format!("\n{}\n", SOURCES_HEADING)).count(), 1);

        let report = lint(&md);
        assert!(report.is_valid(), "{:?}", report.issues);
        assert_eq!(report.story_count, 2);
        assert_eq!(report.source_url_count, 2);
    }

    #[test]
    fn test_lint_huge_source_number() {
        let md = "# Finance News Report: X\n\n\
                  ## Comprehensive Summary\n\nText.\n\n\
                  ## Key News Stories\n\n\
                  - **A**\n  - **Date:** 2025-01-01\n  - **Summary:** s\n  - **Source URL:** https://a.com/x\n\n\
                  ## Financial Context\n\nx\n\n\
                  ## Data Sourcing Notes\n\n- n\n\n\
                  ## Source URLs\n\n1. https://a.com/x\n4294967295. https://b.com\n4294967295. https://c.com\n\
                  99999999999. https://d.com\n";
        let report = lint(md);
        let rules: Vec<&LintRule> = report.issues.iter().map(|i| &i.rule).collect();
        assert!(rules.contains(&&LintRule::SourceNumbering {
            expected: 2,
            found: u32::MAX
        }));
        // u32::MAX followed by u32::MAX is accepted once the counter saturates.
        assert_eq!(
            rules
                .iter()
                .filter(|r| matches!(r, LintRule::SourceNumbering { .. }))
                .count(),
            1
        );
        // Too large for a list number at all.
        assert!(rules.contains(&&LintRule::SourceNotNumbered));
        assert_eq!(report.source_url_count, 4);
    }

    #[test]
    fn test_title_must_be_first_line() {
        let body = "# Finance News Report: Acme\n\n\
                    ## Comprehensive Summary\n\nText.\n\n\
                    ## Key News Stories\n\n\
                    - **A**\n  - **Date:** 2025-01-01\n  - **Summary:** s\n  - **Source URL:** https://x.example.com/a\n\n\
                    ## Financial Context\n\nx\n\n\
                    ## Data Sourcing Notes\n\n- n\n\n\
                    ## Source URLs\n\n1. https://x.example.com/a\n";
        assert!(lint(body).is_valid());
        assert!(lint(&format!("\n\n{}", body)).is_valid());

        let prefaced = format!("Preface text\n{}", body);
        let report = lint(&prefaced);
        assert!(!report.is_valid());
        assert!(report.issues.iter().any(|i| i.rule == LintRule::MissingTitle));
        assert!(parse_markdown(&prefaced).title.is_none());
    }

    #[test]
    fn test_headline_named_like_a_field() {
        let md = "## Key News Stories\n\n\
                  - **Deal closes**\n  - **Date:** 2025-01-01\n\
                  - **Source**\n  - **Summary:** a story about sourcing\n\
                  - **Summary**\n  - **Date:** 2025-01-02\n";
        let parsed = parse_markdown(md);
        let headlines: Vec<&str> = parsed.stories.iter().map(|s| s.headline.as_str()).collect();
        assert_eq!(headlines, vec!["Deal closes", "Source", "Summary"]);
        assert_eq!(parsed.stories[0].source_url, None);
        assert_eq!(
            parsed.stories[1].summary.as_deref(),
            Some("a story about sourcing")
        );
        assert_eq!(parsed.stories[2].date.as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn test_analyze() {
        let md = render_markdown(&sample_report());
        let analysis = analyze("r.md", &md);
        assert_eq!(analysis.total_urls_found, 2);
        assert_eq!(analysis.unique_domains, vec!["inc42.com", "yourstory.com"]);
        assert!(analysis.sections_present.values().all(|v| *v));
        assert_eq!(analysis.line_count, md.matches('\n').count());

        let long = "x".repeat(1500);
        let a = analyze("long.md", &long);
        assert_eq!(a.report_preview.len(), 1003);
        assert!(!a.sections_present["has_title"]);
    }
}
