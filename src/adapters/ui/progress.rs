//! Spinners for long-running steps (LLM calls, crawling).

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Neon-tinted spinner frames.
const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"];

/// Start a steadily ticking spinner with `message`.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.magenta} {msg:.cyan} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS);
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(90));
    pb
}

/// Stop the spinner, leaving a final line.
pub fn finish(pb: &ProgressBar, message: impl Into<String>) {
    pb.finish_with_message(message.into());
}
