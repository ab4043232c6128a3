mod config;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;

use config::BotConfig;
use kicker_commands::host::{ChannelNotifier, GuildMemberKicker};
use kicker_commands::{handle_interaction, handle_message};
use kicker_core::{Context, FileLogFactory, PurgeService, RunMode, TaskFailure};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(config.token.clone()));

    let (purge, failures) = PurgeService::new(
        Arc::new(GuildMemberKicker::new(Arc::clone(&http))),
        Arc::new(FileLogFactory::new(config.log_dir.clone())),
        Arc::new(ChannelNotifier::new(Arc::clone(&http))),
        config.mode,
    );
    tokio::spawn(report_task_failures(failures));

    if config.mode == RunMode::Simulated {
        warn!("SIMULATE is on: kick sessions will not remove anyone");
    }
    info!(log_dir = %config.log_dir.display(), "kick session logs directory");

    let ctx = Context::new(Arc::clone(&http), Arc::new(purge));

    // Members are needed to build kick lists
    let intents = Intents::GUILDS
        | Intents::GUILD_MEMBERS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT;

    let mut shard = Shard::new(ShardId::new(0, 1), config.token, intents);

    info!("Kicker is connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        match event {
            Event::Ready(_) => {
                info!("Kicker is ready.");
            }
            // Handlers await user-facing HTTP calls, so they run off the gateway loop.
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "message handler failed");
                    }
                });
            }
            Event::InteractionCreate(interaction) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_interaction(ctx, interaction).await {
                        error!(?source, "interaction handler failed");
                    }
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Process-level handler for kick sessions that died on an executor error.
async fn report_task_failures(mut failures: mpsc::UnboundedReceiver<TaskFailure>) {
    while let Some(failure) = failures.recv().await {
        error!(
            guild_id = failure.scope.get(),
            session = %failure.session,
            error = %format!("{:#}", failure.error),
            "kick session aborted by an unrecovered failure"
        );
    }
}
