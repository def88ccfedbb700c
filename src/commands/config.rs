use crate::state::Context;

/// Show the retrieval and generation settings (admin only)
#[poise::command(slash_command)]
pub async fn config(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    ctx.say(format!(
        "**Configuración:**\n{}",
        ctx.data().config.summary()
    ))
    .await?;
    Ok(())
}
