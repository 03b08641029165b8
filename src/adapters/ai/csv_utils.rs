//! CSV utilities for LLM context. Uses the `csv` crate for safe serialization.
//!
//! Converts search hits to the semicolon-delimited context the composer prompt expects.

use crate::domain::SearchHit;

const HEADER: &str = "Date;Title;URL;Snippet\n";

/// Convert search hits to a CSV string for LLM context, at most `max_chars` long.
///
/// Format: `Date;Title;URL;Snippet` (semicolon-delimited for LLM token efficiency).
/// Rows that would overflow the budget are dropped; the header is always present.
/// Returns the CSV and the number of rows written.
pub fn hits_to_csv(hits: &[SearchHit], max_chars: usize) -> Result<(String, usize), csv::Error> {
    let mut out = String::with_capacity(max_chars.min(16 * 1024));
    out.push_str(HEADER);
    let mut rows = 0;

    for hit in hits {
        let row = format_hit_row(hit)?;
        if out.len() + row.len() > max_chars {
            continue;
        }
        out.push_str(&row);
        rows += 1;
    }

    Ok((out, rows))
}

fn format_hit_row(hit: &SearchHit) -> Result<String, csv::Error> {
    // Newlines would break the one-row-per-hit layout
    let flat = |s: &str| s.replace(['\n', '\r'], " ").trim().to_string();

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record([
        flat(hit.published.as_deref().unwrap_or("")),
        flat(&hit.title),
        flat(&hit.url),
        flat(&hit.snippet),
    ])?;
    wtr.flush()?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    let mut row = String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    if !row.ends_with('\n') {
        row.push('\n');
    }
    Ok(row)
}
