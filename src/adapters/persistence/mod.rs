//! Persistence adapters: report files, ingestion JSON documents and the SQLite article index.

pub mod article_files;
pub mod catalog_json;
pub mod ledger_json;
pub mod report_store;
pub mod sqlite_repo;

pub use article_files::JsonArticleFiles;
pub use catalog_json::JsonSourceCatalog;
pub use ledger_json::JsonUrlLedger;
pub use report_store::FsReportStore;
pub use sqlite_repo::SqliteRepo;

use crate::domain::DomainError;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Atomic save using the write-replace pattern.
/// 1. Write to temp file
/// 2. sync_all() to ensure flush to disk
/// 3. Atomic rename to target path
///
/// A crash mid-write leaves the previous file intact.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::Repo(format!("create dir {}: {}", parent.display(), e)))?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = std::path::PathBuf::from(temp_name);

    let mut f = fs::File::create(&temp_path)
        .await
        .map_err(|e| DomainError::Repo(format!("create temp file: {}", e)))?;
    f.write_all(bytes)
        .await
        .map_err(|e| DomainError::Repo(format!("write temp file: {}", e)))?;
    f.sync_all()
        .await
        .map_err(|e| DomainError::Repo(format!("sync temp file: {}", e)))?;
    drop(f);

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| DomainError::Repo(format!("atomic rename failed: {}", e)))
}

/// Read a JSON document. A missing file is `Ok(None)`; a corrupt one is an error.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DomainError> {
    match fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s)
            .map(Some)
            .map_err(|e| DomainError::State(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DomainError::Repo(format!("{}: {}", path.display(), e))),
    }
}
