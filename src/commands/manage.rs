use super::{send_chunked, session_key};
use crate::state::Context;

/// Show your conversation history in this channel
#[poise::command(slash_command)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Max entries to show"] limit: Option<u32>,
) -> Result<(), anyhow::Error> {
    let limit = limit.unwrap_or(10) as usize;
    let session = ctx.data().session(session_key(&ctx)).await;
    let rendered = {
        let session = session.lock().await;
        if session.is_empty() {
            None
        } else {
            Some(session.render(limit))
        }
    };

    match rendered {
        Some(text) => send_chunked(&ctx, &text).await,
        None => {
            ctx.say("Aún no hay preguntas en esta conversación. Usa `/constitucion ask`.")
                .await?;
            Ok(())
        }
    }
}

/// Clear your conversation history in this channel
#[poise::command(slash_command)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let session = ctx.data().session(session_key(&ctx)).await;
    session.lock().await.clear();
    ctx.say("Historial borrado.").await?;
    Ok(())
}
