//! Implements UrlLedgerPort using one JSON file per source.
//!
//! `<dir>/<source_id>.json` holds the sorted list of every URL discovered for that source.

use super::{read_json, write_atomic};
use crate::domain::DomainError;
use crate::ports::UrlLedgerPort;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub struct JsonUrlLedger {
    dir: PathBuf,
    /// Serialises read-merge-write cycles.
    write_lock: Mutex<()>,
}

impl JsonUrlLedger {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn file(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", source_id))
    }
}

#[async_trait::async_trait]
impl UrlLedgerPort for JsonUrlLedger {
    async fn seen(&self, source_id: &str) -> Result<HashSet<String>, DomainError> {
        let urls: Option<Vec<String>> = read_json(&self.file(source_id)).await?;
        Ok(urls.unwrap_or_default().into_iter().collect())
    }

    async fn record(&self, source_id: &str, urls: &[String]) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let path = self.file(source_id);
        let existing: Vec<String> = read_json(&path).await?.unwrap_or_default();
        let before = existing.len();

        let merged: BTreeSet<String> = existing.into_iter().chain(urls.iter().cloned()).collect();
        let json = serde_json::to_string_pretty(&merged)
            .map_err(|e| DomainError::State(e.to_string()))?;
        write_atomic(&path, json.as_bytes()).await?;

        debug!(source_id, before, after = merged.len(), "url ledger updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_merges_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonUrlLedger::new(dir.path());

        assert!(ledger.seen("inc42").await.unwrap().is_empty());

        ledger
            .record("inc42", &["https://b".to_string(), "https://a".to_string()])
            .await
            .unwrap();
        ledger
            .record("inc42", &["https://a".to_string(), "https://c".to_string()])
            .await
            .unwrap();

        let seen = ledger.seen("inc42").await.unwrap();
        assert_eq!(seen.len(), 3);
        assert!(ledger.seen("other").await.unwrap().is_empty());

        let raw = std::fs::read_to_string(dir.path().join("inc42.json")).unwrap();
        let stored: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec!["https://a", "https://b", "https://c"]);
    }
}
