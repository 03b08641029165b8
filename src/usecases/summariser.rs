//! Article summarisation stage. Bounded-concurrency LLM calls over saved articles.

use crate::domain::DomainError;
use crate::ports::{AiPort, ArticleFilesPort};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SummaryStats {
    pub summarised: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Summarised,
    Skipped,
    Failed,
}

/// Replaces each article's raw text with an LLM title, summary and keywords.
pub struct Summariser {
    ai: Arc<dyn AiPort>,
    files: Arc<dyn ArticleFilesPort>,
    max_concurrent: usize,
}

impl Summariser {
    pub fn new(ai: Arc<dyn AiPort>, files: Arc<dyn ArticleFilesPort>, max_concurrent: usize) -> Self {
        Self {
            ai,
            files,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Summarise every listed article. Articles without text or with a summary are skipped;
    /// a failed LLM call leaves the article file untouched.
    pub async fn summarise_all(&self, paths: &[String]) -> SummaryStats {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(paths.len());

        for path in paths {
            let sem = Arc::clone(&semaphore);
            let ai = Arc::clone(&self.ai);
            let files = Arc::clone(&self.files);
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                match Self::summarise_one(&*ai, &*files, &sem, &path).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(path = %path, error = %e, "summarisation failed");
                        Outcome::Failed
                    }
                }
            }));
        }

        let mut stats = SummaryStats::default();
        for handle in handles {
            match handle.await {
                Ok(Outcome::Summarised) => stats.summarised += 1,
                Ok(Outcome::Skipped) => stats.skipped += 1,
                Ok(Outcome::Failed) => stats.failed += 1,
                Err(e) => {
                    error!(error = %e, "summarisation task panicked");
                    stats.failed += 1;
                }
            }
        }
        info!(
            summarised = stats.summarised,
            skipped = stats.skipped,
            failed = stats.failed,
            "summarisation finished"
        );
        stats
    }

    async fn summarise_one(
        ai: &dyn AiPort,
        files: &dyn ArticleFilesPort,
        semaphore: &Semaphore,
        path: &str,
    ) -> Result<Outcome, DomainError> {
        let mut article = files.load(path).await?;
        if article.has_summary() {
            debug!(path, "summary already present, skipping");
            return Ok(Outcome::Skipped);
        }
        let Some(text) = article.text.as_deref().filter(|t| !t.trim().is_empty()) else {
            debug!(path, "no article text, skipping");
            return Ok(Outcome::Skipped);
        };

        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| DomainError::State(e.to_string()))?;
        let digest = ai.summarize_article(text).await?;

        if !digest.title.trim().is_empty() {
            article.title = digest.title.trim().to_string();
        }
        article.summary = Some(digest.summary.trim().to_string());
        article.keywords = digest.keywords;
        article.text = None;
        files.save(&article).await?;
        debug!(path, "summary saved");
        Ok(Outcome::Summarised)
    }
}
