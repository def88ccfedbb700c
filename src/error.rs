use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

/// Failures surfaced by the query pipeline. None of them are retried.
#[derive(Error, Debug)]
pub enum RagError {
    /// A provider (embedding, vector store, generation) could not be reached
    /// or answered with an error status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A provider answered, but not with the shape we expect.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("generative model returned no text")]
    EmptyGeneration,
}

impl From<reqwest::Error> for RagError {
    fn from(e: reqwest::Error) -> Self {
        RagError::UpstreamUnavailable(e.to_string())
    }
}

impl From<mongodb::error::Error> for RagError {
    fn from(e: mongodb::error::Error) -> Self {
        RagError::UpstreamUnavailable(e.to_string())
    }
}
