use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RagError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Thin client for the Generative Language REST API. Holds no per-query state,
/// so one instance is shared by the embedder and the synthesizer.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `{base}/models/{model}:{method}`, accepting model ids with or without
    /// the `models/` prefix.
    fn endpoint(&self, model: &str, method: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let model = model.trim_start_matches("models/");
        format!("{}/models/{}:{}", base, model, method)
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<String> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!(%status, "Gemini request failed");
            return Err(RagError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status,
                text.chars().take(300).collect::<String>()
            )));
        }
        Ok(text)
    }

    /// Embed a single text with the given embedding model.
    pub async fn embed_content(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            model: format!("models/{}", model.trim_start_matches("models/")),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
        };

        let raw = self.post(&self.endpoint(model, "embedContent"), &body).await?;
        let parsed: EmbedResponse = serde_json::from_str(&raw)
            .map_err(|e| RagError::InvalidResponse(format!("embedContent body: {}", e)))?;

        let values = parsed
            .embedding
            .and_then(|e| e.values)
            .ok_or_else(|| RagError::InvalidResponse("missing embedding.values".to_string()))?;

        debug!(model, dims = values.len(), "embedding received");
        Ok(values)
    }

    /// Non-streaming generation. Returns the first candidate's text exactly as
    /// produced; blank output counts as no generation.
    pub async fn generate_content(&self, model: &str, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };

        let raw = self
            .post(&self.endpoint(model, "generateContent"), &body)
            .await?;
        let parsed: GenerateResponse = serde_json::from_str(&raw)
            .map_err(|e| RagError::InvalidResponse(format!("generateContent body: {}", e)))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(RagError::EmptyGeneration);
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            debug!(finish_reason = ?candidate.finish_reason, "candidate had no text");
            return Err(RagError::EmptyGeneration);
        }

        Ok(text)
    }
}
