use tracing::{info, warn};

use super::{send_chunked, session_key};
use crate::error::RagError;
use crate::state::Context;

/// Ask a question about the Constitution
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Tu pregunta sobre la Constitución del Perú"] pregunta: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    info!(
        user = ctx.author().name,
        question_len = pregunta.len(),
        "question received"
    );

    match ctx.data().ask(session_key(&ctx), &pregunta).await {
        Ok(answer) => {
            info!(answer_len = answer.len(), "question answered");
            let full = format!("**Pregunta:** {}\n\n{}", pregunta, answer);
            send_chunked(&ctx, &full).await
        }
        Err(e) => {
            warn!(error = %e, "question failed");
            ctx.say(user_message(&e)).await?;
            Ok(())
        }
    }
}

/// What the user sees for a failed query. Provider details stay in the logs.
fn user_message(err: &RagError) -> &'static str {
    match err {
        RagError::EmptyGeneration => {
            "No pude generar una respuesta para esta pregunta. Intenta reformularla."
        }
        RagError::UpstreamUnavailable(_) | RagError::InvalidResponse(_) => {
            "No pude completar la consulta en este momento. Intenta de nuevo más tarde."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_provider_detail() {
        let err = RagError::UpstreamUnavailable(
            "HTTP 403 Forbidden: {\"error\": {\"message\": \"API key not valid\"}}".to_string(),
        );
        let msg = user_message(&err);
        assert!(!msg.contains("403"));
        assert!(!msg.contains("API key"));

        let msg = user_message(&RagError::InvalidResponse("missing embedding.values".into()));
        assert!(!msg.contains("embedding"));
    }

    #[test]
    fn test_empty_generation_suggests_rephrasing() {
        assert!(user_message(&RagError::EmptyGeneration).contains("reformularla"));
    }
}
