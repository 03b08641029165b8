//! Implements SourceCatalogPort over a JSON array of feed sources (`sources.json`).

use super::{read_json, write_atomic};
use crate::domain::{DomainError, FeedSource};
use crate::ports::SourceCatalogPort;
use std::path::{Path, PathBuf};

pub struct JsonSourceCatalog {
    path: PathBuf,
}

impl JsonSourceCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl SourceCatalogPort for JsonSourceCatalog {
    /// A missing catalog is empty; a malformed one is a configuration error.
    async fn load(&self) -> Result<Vec<FeedSource>, DomainError> {
        match read_json(&self.path).await {
            Ok(sources) => Ok(sources.unwrap_or_default()),
            Err(DomainError::State(msg)) => Err(DomainError::Config(msg)),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, sources: &[FeedSource]) -> Result<(), DomainError> {
        let json = serde_json::to_string_pretty(sources)
            .map_err(|e| DomainError::State(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes()).await
    }
}
