//! Implements ReportStorePort. One Markdown file per report in the output folder.

use super::write_atomic;
use crate::domain::{DomainError, ReportFileInfo};
use crate::ports::ReportStorePort;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File-system report store rooted at the output directory.
pub struct FsReportStore {
    dir: PathBuf,
}

impl FsReportStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a bare file name inside the output folder. Anything that could
    /// escape the folder (separators, `..`, hidden names) is rejected.
    fn resolve(&self, filename: &str) -> Result<PathBuf, DomainError> {
        let name = filename.trim();
        if name.is_empty()
            || name.contains(['/', '\\', '\0'])
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(DomainError::InvalidFileName(filename.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Existing regular file for `filename`.
    async fn existing_file(&self, filename: &str) -> Result<PathBuf, DomainError> {
        let path = self.resolve(filename)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(DomainError::NotAFile(filename.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DomainError::ReportNotFound(filename.to_string()))
            }
            Err(e) => Err(DomainError::Repo(e.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl ReportStorePort for FsReportStore {
    async fn save(&self, filename: &str, content: &str) -> Result<PathBuf, DomainError> {
        let path = self.resolve(filename)?;
        write_atomic(&path, content.as_bytes()).await?;
        info!(path = %path.display(), bytes = content.len(), "report saved");
        Ok(path)
    }

    async fn read(&self, filename: &str) -> Result<String, DomainError> {
        let path = self.existing_file(filename).await?;
        fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<ReportFileInfo>, DomainError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(DomainError::Repo(e.to_string())),
        };

        let mut reports = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".md") {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(e) => {
                    debug!(filename, error = %e, "skipping unreadable report");
                    continue;
                }
            };
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            reports.push(ReportFileInfo {
                filename,
                size_bytes: meta.len(),
                modified,
            });
        }

        reports.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(reports)
    }

    async fn delete(&self, filename: &str) -> Result<(), DomainError> {
        let path = self.existing_file(filename).await?;
        fs::remove_file(&path)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        info!(path = %path.display(), "report deleted");
        Ok(())
    }
}
