//! Tag queries and pruning over the article index.

use crate::domain::DomainError;
use crate::ports::ArticleIndexPort;
use std::sync::Arc;
use tracing::info;

pub struct ArchiveQuery {
    index: Arc<dyn ArticleIndexPort>,
}

impl ArchiveQuery {
    pub fn new(index: Arc<dyn ArticleIndexPort>) -> Self {
        Self { index }
    }

    /// Paths of articles carrying all `tags` and any of `subtags`.
    pub async fn find(
        &self,
        tags: &[String],
        subtags: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let tags = clean(tags);
        let subtags = clean(subtags);
        if tags.is_empty() && subtags.is_empty() {
            return Err(DomainError::InvalidQuery(
                "at least one tag or subtag is required".to_string(),
            ));
        }
        let paths = self.index.find_paths(&tags, &subtags).await?;
        info!(?tags, ?subtags, matches = paths.len(), "archive query");
        Ok(paths)
    }

    /// Delete indexed articles whose path contains `date`.
    pub async fn prune(&self, date: &str) -> Result<u64, DomainError> {
        let date = date.trim();
        if date.is_empty() {
            return Err(DomainError::InvalidQuery("date must not be empty".to_string()));
        }
        let removed = self.index.delete_by_date(date).await?;
        info!(date, removed, "pruned articles");
        Ok(removed)
    }

    pub async fn all_paths(&self) -> Result<Vec<String>, DomainError> {
        self.index.all_paths().await
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
