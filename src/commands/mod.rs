mod ask;
mod config;
mod manage;

use crate::state::Context;

/// Asistente de la Constitución Política del Perú
#[poise::command(
    slash_command,
    subcommands("ask::ask", "manage::history", "manage::clear", "config::config")
)]
pub async fn constitucion(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

fn session_key(ctx: &Context<'_>) -> crate::state::SessionKey {
    (ctx.channel_id().get(), ctx.author().id.get())
}

/// Send a message in Discord-safe chunks (max 1990 chars), splitting on a
/// newline or space when possible.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in split_chunks(text, 1990) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

fn split_chunks(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut limit = remaining.len().min(max);
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let split_at = if limit < remaining.len() {
            remaining[..limit]
                .rfind('\n')
                .or_else(|| remaining[..limit].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(limit)
        } else {
            limit
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_chunks("hola", 1990), vec!["hola"]);
        assert!(split_chunks("", 1990).is_empty());
    }

    #[test]
    fn test_splits_on_newline_then_space() {
        assert_eq!(split_chunks("abc\ndef ghi", 6), vec!["abc\n", "def ", "ghi"]);
    }

    #[test]
    fn test_never_splits_inside_a_char() {
        let text = "ñññññ";
        let chunks = split_chunks(text, 3);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.len() <= 3));
    }
}
