//! Question answering over the indexed constitution.
//!
//! ```text
//! question -> Embedder -> Retriever --(no passages)--> fallback literal
//!                             |
//!                             +--> Synthesizer -> answer
//! ```

pub mod atlas;
pub mod embed;
pub mod memory;
pub mod prompts;
pub mod synth;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::session::Session;

/// Answer given when retrieval succeeds with zero passages.
pub const NO_MATCH_ANSWER: &str = "No encontré información relevante en la Constitución.";

pub const DEFAULT_TOP_K: usize = 5;

pub type Embedding = Vec<f32>;

/// One retrieved passage of the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub text: String,
    /// Similarity score, higher is more relevant.
    pub score: f64,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding>;

    fn model_name(&self) -> &str;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Top `k` passages by descending score. An empty vec is a valid outcome.
    async fn retrieve(&self, vector: &[f32], k: usize) -> Result<Vec<Passage>>;
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// `passages` is never empty and arrives in rank order.
    async fn synthesize(&self, question: &str, passages: &[Passage]) -> Result<String>;
}

pub struct QueryOrchestrator {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    synthesizer: Arc<dyn Synthesizer>,
    top_k: usize,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        synthesizer: Arc<dyn Synthesizer>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            retriever,
            synthesizer,
            top_k: top_k.max(1),
        }
    }

    pub async fn answer_question(&self, question: &str) -> Result<String> {
        debug!(model = self.embedder.model_name(), "embedding question");
        let vector = self.embedder.embed(question).await.inspect_err(|e| {
            warn!(error = %e, "embedding failed");
        })?;

        debug!(dims = vector.len(), k = self.top_k, "retrieving passages");
        let passages = self
            .retriever
            .retrieve(&vector, self.top_k)
            .await
            .inspect_err(|e| warn!(error = %e, "retrieval failed"))?;

        if passages.is_empty() {
            info!("no passages retrieved, answering with fallback");
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        debug!(
            passages = passages.len(),
            top_score = passages[0].score,
            "synthesizing answer"
        );
        self.synthesizer
            .synthesize(question, &passages)
            .await
            .inspect_err(|e| warn!(error = %e, "synthesis failed"))
    }

    /// Answer and record the exchange in `session`. Failed queries leave the
    /// transcript untouched.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<String> {
        let answer = self.answer_question(question).await?;
        session.record_exchange(question, &answer);
        Ok(answer)
    }
}
