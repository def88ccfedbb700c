mod commands;
mod config;
mod error;
mod gemini;
mod rag;
mod session;
mod state;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info, warn, Level};

use config::{RagConfig, StoreConfig};
use gemini::GeminiClient;
use rag::atlas::AtlasRetriever;
use rag::embed::GeminiEmbedder;
use rag::memory::MemoryRetriever;
use rag::synth::GeminiSynthesizer;
use rag::{QueryOrchestrator, Retriever};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN")
        .ok()
        .context("DISCORD_TOKEN required")?;
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    let config = Arc::new(RagConfig::from_env()?);

    let gemini = Arc::new(GeminiClient::new(
        &config.gemini_base_url,
        &config.google_api_key,
    )?);
    info!(
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        "Gemini client initialized"
    );

    let retriever: Arc<dyn Retriever> = match &config.store {
        StoreConfig::Atlas { uri, index } => {
            let atlas = AtlasRetriever::connect(uri, index.clone())
                .await
                .context("Failed to init MongoDB client")?;
            info!(
                database = %index.database,
                collection = %index.collection,
                index = %index.index_name,
                "Atlas vector search initialized"
            );
            Arc::new(atlas)
        }
        StoreConfig::Memory { path } => {
            let memory = MemoryRetriever::load(path).await?;
            if memory.is_empty() {
                warn!(path = ?path, "memory store is empty, every question will fall back");
            }
            Arc::new(memory)
        }
    };

    let orchestrator = Arc::new(QueryOrchestrator::new(
        Arc::new(GeminiEmbedder::new(gemini.clone(), &config.embedding_model)),
        retriever,
        Arc::new(GeminiSynthesizer::new(
            gemini,
            &config.generation_model,
            config.prompt.clone(),
        )),
        config.top_k,
    ));

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState::new(orchestrator, config, admin_ids);

    let intents =
        serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::constitucion()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    )
                    .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting constitution assistant...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
