// This is the entry point of the banned-word moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (database, config)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services and connect the term store (dependency injection)
// 3. Set up the Discord framework
// 4. Close the store again on shutdown

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationService, TokioSleeper};
use crate::discord::{Data, Error};
use crate::infra::config::AppConfig;
use crate::infra::moderation::SqliteTermStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

const STORE_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Logged in as {}!", data_about_bot.user.tag());
        }
        serenity::FullEvent::Message { new_message } => {
            // Each message is dispatched on its own task, so a failure here
            // only affects this message
            if let Err(e) =
                discord::moderation::handle_message_for_banned_words(ctx, new_message, data).await
            {
                tracing::error!("Error checking message for banned words: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The store is created here and handed to the service; nothing else
    // holds a global connection.

    let term_store = SqliteTermStore::new(config.database_url.clone(), config.store_timeout);
    let moderation = Arc::new(ModerationService::new(term_store));

    // No gateway connection until the store answers. Exhausted retries are fatal.
    moderation
        .connect(&config.connect_retry, &TokioSleeper)
        .await
        .context("Failed to initialize term store")?;

    let data = Data {
        moderation: Arc::clone(&moderation),
    };

    let result = run_bot(&config.token, data).await;

    tracing::info!("Shutting down...");
    if tokio::time::timeout(STORE_CLOSE_TIMEOUT, moderation.close())
        .await
        .is_err()
    {
        tracing::warn!("Timed out closing the term store");
    }

    result
}

/// Build the framework and run the gateway until a shutdown signal arrives.
async fn run_bot(token: &str, data: Data) -> anyhow::Result<()> {
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT; // Required to read message content

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::general::ping(),
                discord::commands::banned_words::ban_word(),
                discord::commands::banned_words::unban_word(),
                discord::commands::banned_words::list_banned_words(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!(
                    "Registered {} global commands",
                    framework.options().commands.len()
                );
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        shutdown_signal().await;
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Error running bot")
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
