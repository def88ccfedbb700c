use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{Passage, Retriever};
use crate::error::{RagError, Result};

/// One pre-computed record of the exported index.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredPassage {
    #[serde(alias = "texto")]
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Exact cosine-similarity retriever over passages held in memory.
///
/// Brute force over every record, so only suitable for a corpus the size of a
/// single document. Records are loaded from a JSON-lines export of the Atlas
/// collection; nothing is embedded here.
#[derive(Default)]
pub struct MemoryRetriever {
    records: Vec<StoredPassage>,
}

impl MemoryRetriever {
    pub fn new(records: Vec<StoredPassage>) -> Self {
        Self { records }
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read passage export {:?}", path))?;
        let store = Self::new(parse_jsonl(&raw)?);
        info!(count = store.len(), path = ?path, "passages loaded into memory");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse one JSON object per non-blank line.
pub fn parse_jsonl(raw: &str) -> anyhow::Result<Vec<StoredPassage>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid record on line {}", i + 1))
        })
        .collect()
}

#[async_trait]
impl Retriever for MemoryRetriever {
    async fn retrieve(&self, vector: &[f32], k: usize) -> Result<Vec<Passage>> {
        let mut scored = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if record.embedding.len() != vector.len() {
                return Err(RagError::InvalidResponse(format!(
                    "query vector has {} dimensions, index has {}",
                    vector.len(),
                    record.embedding.len()
                )));
            }
            scored.push(Passage {
                text: record.text.clone(),
                score: cosine_similarity(vector, &record.embedding) as f64,
            });
        }

        // Stable sort: equal scores keep export order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Returns a value in [-1, 1]; zero vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, embedding: Vec<f32>) -> StoredPassage {
        StoredPassage {
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_sorted_by_descending_score() {
        let store = MemoryRetriever::new(vec![
            record("lejos", vec![0.0, 1.0, 0.0]),
            record("idéntico", vec![1.0, 0.0, 0.0]),
            record("medio", vec![0.5, 0.5, 0.0]),
        ]);

        let results = store.retrieve(&[1.0, 0.0, 0.0], 3).await.unwrap();

        let texts: Vec<_> = results.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["idéntico", "medio", "lejos"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_k_bounds_results() {
        let records = (0..50)
            .map(|i| record(&format!("Artículo {}", i), vec![1.0, i as f32 / 50.0]))
            .collect();
        let store = MemoryRetriever::new(records);

        let results = store.retrieve(&[1.0, 0.0], 5).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].text, "Artículo 0");
    }

    #[tokio::test]
    async fn test_k_larger_than_store() {
        let store = MemoryRetriever::new(vec![record("único", vec![1.0, 0.0])]);
        let results = store.retrieve(&[1.0, 0.0], 100).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_is_not_an_error() {
        let store = MemoryRetriever::default();
        assert!(store.is_empty());
        let results = store.retrieve(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_invalid_response() {
        let store = MemoryRetriever::new(vec![record("a", vec![1.0, 0.0, 0.0])]);
        let err = store.retrieve(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_jsonl_accepts_texto_alias_and_skips_blank_lines() {
        let raw = "{\"texto\": \"Artículo 1.- La defensa de la persona humana...\", \"embedding\": [0.1, 0.2]}\n\
                   \n\
                   {\"text\": \"Artículo 2.- Toda persona tiene derecho...\", \"embedding\": [0.3, 0.4]}\n";
        let records = parse_jsonl(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].text.starts_with("Artículo 1."));
        assert_eq!(records[1].embedding, vec![0.3, 0.4]);
    }

    #[test]
    fn test_parse_jsonl_reports_line_number() {
        let raw = "{\"texto\": \"a\", \"embedding\": [1.0]}\n{\"texto\": \"b\"}\n";
        let err = parse_jsonl(raw).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
