//! Implements ArticleFilesPort. One pretty-printed JSON document per article.

use super::{read_json, write_atomic};
use crate::domain::{ArticleRecord, DomainError};
use crate::ports::ArticleFilesPort;
use std::path::{Path, PathBuf};

pub struct JsonArticleFiles {
    dir: PathBuf,
}

impl JsonArticleFiles {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn file(&self, path: &str) -> Result<PathBuf, DomainError> {
        if path.is_empty() || path.contains(['/', '\\']) || path.contains("..") {
            return Err(DomainError::InvalidFileName(path.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", path)))
    }
}

#[async_trait::async_trait]
impl ArticleFilesPort for JsonArticleFiles {
    async fn save(&self, article: &ArticleRecord) -> Result<(), DomainError> {
        let file = self.file(&article.path)?;
        let json = serde_json::to_string_pretty(article)
            .map_err(|e| DomainError::State(e.to_string()))?;
        write_atomic(&file, json.as_bytes()).await
    }

    async fn load(&self, path: &str) -> Result<ArticleRecord, DomainError> {
        read_json(&self.file(path)?)
            .await?
            .ok_or_else(|| DomainError::Repo(format!("article {} not found", path)))
    }
}
