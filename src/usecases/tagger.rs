//! Keyword tagging stage.
//!
//! Proper keywords (names) match by case-insensitive substring of the summary.
//! Common keywords match by cosine similarity between the summary embedding and
//! the keyword embedding. A matching keyword becomes a subtag and its group a tag.

use crate::domain::{ArticleRecord, DomainError, TagConfig};
use crate::ports::{AiPort, ArticleFilesPort};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// (tag, keyword, embedding) for every common keyword.
type KeywordVectors = Vec<(String, String, Vec<f32>)>;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

pub struct Tagger {
    ai: Arc<dyn AiPort>,
    files: Arc<dyn ArticleFilesPort>,
    config: TagConfig,
    threshold: f32,
    /// Keyword embeddings, computed once per tagger.
    keyword_vectors: OnceCell<KeywordVectors>,
}

impl Tagger {
    pub fn new(
        ai: Arc<dyn AiPort>,
        files: Arc<dyn ArticleFilesPort>,
        config: TagConfig,
        threshold: f32,
    ) -> Self {
        Self {
            ai,
            files,
            config,
            threshold,
            keyword_vectors: OnceCell::new(),
        }
    }

    async fn keyword_vectors(&self) -> Result<&KeywordVectors, DomainError> {
        self.keyword_vectors
            .get_or_try_init(|| async {
                let pairs: Vec<(String, String)> = self
                    .config
                    .keywords_common
                    .iter()
                    .flat_map(|(tag, kws)| kws.iter().map(move |k| (tag.clone(), k.clone())))
                    .collect();
                let words: Vec<String> = pairs.iter().map(|(_, k)| k.clone()).collect();
                let vectors = self.ai.embed(&words).await?;
                debug!(keywords = words.len(), "keyword embeddings ready");
                Ok(pairs
                    .into_iter()
                    .zip(vectors)
                    .map(|((tag, kw), v)| (tag, kw, v))
                    .collect())
            })
            .await
    }

    /// Set `tags` and `subtags` (sorted, unique) on an article from its summary.
    ///
    /// Articles without a summary are left unchanged. When embeddings are unavailable
    /// only proper keywords are applied.
    pub async fn tag(&self, article: &mut ArticleRecord) -> Result<bool, DomainError> {
        let Some(summary) = article.summary.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(false);
        };
        let lower = summary.to_lowercase();
        let mut tags = BTreeSet::new();
        let mut subtags = BTreeSet::new();

        for (tag, words) in &self.config.keywords_proper {
            for word in words {
                if !word.is_empty() && lower.contains(&word.to_lowercase()) {
                    tags.insert(tag.clone());
                    subtags.insert(word.clone());
                }
            }
        }

        if !self.config.keywords_common.is_empty() {
            match self.semantic_matches(summary).await {
                Ok(matches) => {
                    for (tag, kw) in matches {
                        tags.insert(tag);
                        subtags.insert(kw);
                    }
                }
                Err(e) => warn!(path = %article.path, error = %e, "semantic tagging unavailable"),
            }
        }

        article.tags = tags.into_iter().collect();
        article.subtags = subtags.into_iter().collect();
        Ok(true)
    }

    async fn semantic_matches(&self, summary: &str) -> Result<Vec<(String, String)>, DomainError> {
        let keywords = self.keyword_vectors().await?;
        let summary_vec = self
            .ai
            .embed(&[summary.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::AiFormat("no embedding returned".to_string()))?;
        Ok(keywords
            .iter()
            .filter(|(_, _, v)| cosine_similarity(&summary_vec, v) >= self.threshold)
            .map(|(tag, kw, _)| (tag.clone(), kw.clone()))
            .collect())
    }

    /// Tag and re-save every listed article. Returns how many were tagged.
    pub async fn tag_all(&self, paths: &[String]) -> usize {
        let mut tagged = 0;
        for path in paths {
            let result = async {
                let mut article = self.files.load(path).await?;
                if self.tag(&mut article).await? {
                    self.files.save(&article).await?;
                    return Ok::<bool, DomainError>(true);
                }
                Ok(false)
            }
            .await;
            match result {
                Ok(true) => tagged += 1,
                Ok(false) => debug!(path = %path, "no summary, not tagged"),
                Err(e) => warn!(path = %path, error = %e, "tagging failed"),
            }
        }
        info!(tagged, total = paths.len(), "tagging finished");
        tagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::adapters::persistence::JsonArticleFiles;
    use std::collections::BTreeMap;

    fn config() -> TagConfig {
        let mut proper = BTreeMap::new();
        proper.insert("companies".to_string(), vec!["Zoho".to_string(), "Sarvam".to_string()]);
        let mut common = BTreeMap::new();
        common.insert(
            "funding".to_string(),
            vec!["funding round".to_string(), "weather report".to_string()],
        );
        TagConfig {
            keywords_proper: proper,
            keywords_common: common,
        }
    }

    fn tagger(dir: &std::path::Path) -> Tagger {
        Tagger::new(
            Arc::new(MockAiAdapter::with_delay(0)),
            Arc::new(JsonArticleFiles::new(dir)),
            config(),
            0.5,
        )
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_tag_proper_and_common() {
        let dir = tempfile::tempdir().unwrap();
        let tagger = tagger(dir.path());
        let mut article = ArticleRecord {
            path: "x_0001".into(),
            summary: Some("ZOHO funding round news".into()),
            ..Default::default()
        };
        assert!(tagger.tag(&mut article).await.unwrap());
        assert_eq!(article.tags, vec!["companies", "funding"]);
        assert_eq!(article.subtags, vec!["Zoho", "funding round"]);
    }

    #[tokio::test]
    async fn test_tag_without_summary_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let tagger = tagger(dir.path());
        let mut article = ArticleRecord {
            tags: vec!["keep".into()],
            ..Default::default()
        };
        assert!(!tagger.tag(&mut article).await.unwrap());
        assert_eq!(article.tags, vec!["keep"]);
    }

    #[tokio::test]
    async fn test_tag_all_saves() {
        let dir = tempfile::tempdir().unwrap();
        let files = JsonArticleFiles::new(dir.path());
        files
            .save(&ArticleRecord {
                url: "https://x/1".into(),
                path: "x_0001".into(),
                summary: Some("Sarvam news".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let tagger = tagger(dir.path());
        assert_eq!(
            tagger
                .tag_all(&["x_0001".to_string(), "x_0002".to_string()])
                .await,
            1
        );
        let saved = files.load("x_0001").await.unwrap();
        assert_eq!(saved.tags, vec!["companies"]);
        assert_eq!(saved.subtags, vec!["Sarvam"]);
    }
}
