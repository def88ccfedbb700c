use std::sync::Arc;

use async_trait::async_trait;

use super::{Embedder, Embedding};
use crate::error::Result;
use crate::gemini::GeminiClient;

/// Query embeddings from a Gemini embedding model.
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: Arc<GeminiClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.client.embed_content(&self.model, text).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
