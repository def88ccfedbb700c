use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::prompts::PromptTemplate;
use super::{Passage, Synthesizer};
use crate::error::Result;
use crate::gemini::GeminiClient;

/// Join passage texts in the order given, separated by a blank line.
pub fn build_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Grounded answers from a Gemini generative model.
pub struct GeminiSynthesizer {
    client: Arc<GeminiClient>,
    model: String,
    template: PromptTemplate,
}

impl GeminiSynthesizer {
    pub fn new(client: Arc<GeminiClient>, model: &str, template: PromptTemplate) -> Self {
        Self {
            client,
            model: model.to_string(),
            template,
        }
    }

    pub fn build_prompt(&self, question: &str, passages: &[Passage]) -> String {
        self.template.render(&build_context(passages), question)
    }
}

#[async_trait]
impl Synthesizer for GeminiSynthesizer {
    async fn synthesize(&self, question: &str, passages: &[Passage]) -> Result<String> {
        let prompt = self.build_prompt(question, passages);
        debug!(model = %self.model, prompt_len = prompt.len(), "generating answer");
        self.client.generate_content(&self.model, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn passages() -> Vec<Passage> {
        vec![
            Passage {
                text: "Artículo 2.- Toda persona tiene derecho a la vida.".into(),
                score: 0.9,
            },
            Passage {
                text: "Artículo 24.- El trabajador tiene derecho a una remuneración equitativa.".into(),
                score: 0.7,
            },
        ]
    }

    #[test]
    fn test_build_context_keeps_rank_order() {
        let context = build_context(&passages());
        assert_eq!(
            context,
            "Artículo 2.- Toda persona tiene derecho a la vida.\n\n\
             Artículo 24.- El trabajador tiene derecho a una remuneración equitativa."
        );
    }

    #[test]
    fn test_build_context_does_not_resort_by_score() {
        let mut ps = passages();
        ps.reverse();
        let context = build_context(&ps);
        assert!(context.find("Artículo 24").unwrap() < context.find("Artículo 2.-").unwrap());
    }

    #[tokio::test]
    async fn test_synthesize_sends_grounded_prompt_and_returns_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-flash-latest:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "  Según los artículos 2 y 24...  " }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(GeminiClient::new(&server.uri(), "k").unwrap());
        let synth = GeminiSynthesizer::new(client, "gemini-flash-latest", PromptTemplate::default());

        let answer = synth
            .synthesize("¿Qué derechos tengo?", &passages())
            .await
            .unwrap();
        assert_eq!(answer, "  Según los artículos 2 y 24...  ");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.find("Artículo 2.-").unwrap() < prompt.find("Artículo 24.-").unwrap());
        assert!(prompt.contains("Pregunta: ¿Qué derechos tengo?"));
    }

    #[tokio::test]
    async fn test_synthesize_propagates_empty_generation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = Arc::new(GeminiClient::new(&server.uri(), "k").unwrap());
        let synth = GeminiSynthesizer::new(client, "gemini-flash-latest", PromptTemplate::default());

        let err = synth.synthesize("q", &passages()).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyGeneration));
    }
}
