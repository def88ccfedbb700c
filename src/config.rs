use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use tracing::warn;

use crate::gemini::DEFAULT_BASE_URL;
use crate::rag::atlas::AtlasIndex;
use crate::rag::prompts::PromptTemplate;
use crate::rag::DEFAULT_TOP_K;

pub const DEFAULT_NUM_CANDIDATES: usize = 100;

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Atlas { uri: String, index: AtlasIndex },
    Memory { path: PathBuf },
}

/// Static startup configuration of the query pipeline.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub google_api_key: String,
    pub gemini_base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub store: StoreConfig,
    pub top_k: usize,
    pub num_candidates: usize,
    pub prompt: PromptTemplate,
}

impl RagConfig {
    /// Read from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let google_api_key = lookup("GOOGLE_API_KEY").ok_or_else(|| anyhow!("GOOGLE_API_KEY required"))?;
        let top_k = parse_or(&lookup, "TOP_K", DEFAULT_TOP_K)?;
        let num_candidates = parse_or(&lookup, "NUM_CANDIDATES", DEFAULT_NUM_CANDIDATES)?;

        let store = match or("VECTOR_STORE", "atlas").as_str() {
            "atlas" => StoreConfig::Atlas {
                uri: lookup("MONGODB_URI")
                    .ok_or_else(|| anyhow!("MONGODB_URI required when VECTOR_STORE=atlas"))?,
                index: AtlasIndex {
                    database: or("MONGODB_DATABASE", "pdf_embeddings_db"),
                    collection: or("MONGODB_COLLECTION", "pdf_vectors"),
                    index_name: or("VECTOR_INDEX", "vector_index"),
                    vector_path: or("VECTOR_PATH", "embedding"),
                    text_field: or("TEXT_FIELD", "texto"),
                    num_candidates,
                },
            },
            "memory" => StoreConfig::Memory {
                path: PathBuf::from(or("MEMORY_STORE_PATH", "./data/passages.jsonl")),
            },
            other => bail!("Unknown VECTOR_STORE '{}'. Valid: atlas, memory", other),
        };

        let defaults = PromptTemplate::default();
        let template = match lookup("PROMPT_TEMPLATE_PATH") {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt template {}", path))?,
            None => defaults.template,
        };
        let prompt = PromptTemplate {
            template,
            domain: lookup("PROMPT_DOMAIN").unwrap_or(defaults.domain),
            corpus: lookup("PROMPT_CORPUS").unwrap_or(defaults.corpus),
            language: lookup("PROMPT_LANGUAGE").unwrap_or(defaults.language),
        };

        let config = Self {
            google_api_key,
            gemini_base_url: or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            embedding_model: or("EMBEDDING_MODEL", "text-embedding-004"),
            generation_model: or("GENERATION_MODEL", "gemini-flash-latest"),
            store,
            top_k,
            num_candidates,
            prompt,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            bail!("TOP_K must be at least 1");
        }
        if self.num_candidates < self.top_k {
            bail!(
                "NUM_CANDIDATES ({}) must not be below TOP_K ({})",
                self.num_candidates,
                self.top_k
            );
        }
        if self.num_candidates == self.top_k {
            warn!(
                num_candidates = self.num_candidates,
                "candidate pool equals TOP_K, approximate search quality will suffer"
            );
        }
        let missing = self.prompt.missing_placeholders();
        if !missing.is_empty() {
            bail!("Prompt template is missing {}", missing.join(", "));
        }
        Ok(())
    }

    /// Human-readable summary without secrets.
    pub fn summary(&self) -> String {
        let store = match &self.store {
            StoreConfig::Atlas { index, .. } => format!(
                "atlas `{}.{}` index `{}` (path `{}`, text `{}`)",
                index.database, index.collection, index.index_name, index.vector_path, index.text_field
            ),
            StoreConfig::Memory { path } => format!("memory `{}`", path.display()),
        };
        format!(
            "`embedding_model`: {}\n\
             `generation_model`: {}\n\
             `vector_store`: {}\n\
             `top_k`: {}\n\
             `num_candidates`: {}\n\
             `prompt_domain`: {}",
            self.embedding_model,
            self.generation_model,
            store,
            self.top_k,
            self.num_candidates,
            self.prompt.domain
        )
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} must be a number, got '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
