use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use tracing::debug;

use super::{Passage, Retriever};
use crate::error::{RagError, Result};

/// Where the pre-built Atlas vector index lives and how its documents look.
#[derive(Debug, Clone)]
pub struct AtlasIndex {
    pub database: String,
    pub collection: String,
    pub index_name: String,
    pub vector_path: String,
    pub text_field: String,
    pub num_candidates: usize,
}

/// Approximate nearest-neighbour search through Atlas `$vectorSearch`.
pub struct AtlasRetriever {
    collection: Collection<Document>,
    index: AtlasIndex,
}

impl AtlasRetriever {
    /// Parses the URI and builds a client; the driver connects lazily on the
    /// first query.
    pub async fn connect(uri: &str, index: AtlasIndex) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let collection = client
            .database(&index.database)
            .collection::<Document>(&index.collection);
        Ok(Self { collection, index })
    }
}

impl AtlasIndex {
    pub fn pipeline(&self, vector: &[f32], k: usize) -> Vec<Document> {
        let query_vector: Vec<f64> = vector.iter().map(|v| *v as f64).collect();

        let mut project = Document::new();
        project.insert("_id", 0);
        project.insert(self.text_field.as_str(), 1);
        project.insert("score", doc! { "$meta": "vectorSearchScore" });

        vec![
            doc! {
                "$vectorSearch": {
                    "index": self.index_name.as_str(),
                    "path": self.vector_path.as_str(),
                    "queryVector": query_vector,
                    "numCandidates": self.num_candidates as i64,
                    "limit": k as i64,
                }
            },
            doc! { "$project": project },
        ]
    }

    pub fn parse_passage(&self, document: &Document) -> Result<Passage> {
        let text = document.get_str(&self.text_field).map_err(|_| {
            RagError::InvalidResponse(format!("result document lacks `{}`", self.text_field))
        })?;

        let score = match document.get("score") {
            Some(Bson::Double(s)) => *s,
            Some(Bson::Int32(s)) => *s as f64,
            Some(Bson::Int64(s)) => *s as f64,
            _ => {
                return Err(RagError::InvalidResponse(
                    "result document lacks a numeric score".to_string(),
                ))
            }
        };

        Ok(Passage {
            text: text.to_string(),
            score,
        })
    }
}

#[async_trait]
impl Retriever for AtlasRetriever {
    async fn retrieve(&self, vector: &[f32], k: usize) -> Result<Vec<Passage>> {
        let pipeline = self.index.pipeline(vector, k);
        let mut cursor = self.collection.aggregate(pipeline).await?;

        let mut passages = Vec::with_capacity(k);
        while let Some(document) = cursor.try_next().await? {
            passages.push(self.index.parse_passage(&document)?);
        }
        passages.truncate(k);

        debug!(
            index = %self.index.index_name,
            count = passages.len(),
            "vector search complete"
        );
        Ok(passages)
    }
}
