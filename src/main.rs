use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod cooldown;
mod database;
mod formatter;
mod health;
mod menu;
mod registry;

use config::Config;
use cooldown::{Clock, Cooldown, SystemClock};
use database::Database;
use registry::Registry;

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    registry: Arc<Registry>,
    database: Arc<Database>,
    cooldown: Cooldown,
    clock: Arc<dyn Clock>,
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => error!("Failed to start bot: {}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command error in {}: {}", ctx.command().name, error);
            if let Err(e) = ctx.say("❌ Something went wrong! Please try again later.").await {
                error!("Could not send error message: {}", e);
            }
        }
        // Don't answer unknown commands, it only adds noise to busy channels
        poise::FrameworkError::UnknownCommand { .. } => {}
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tokio::spawn(health::serve(config.health_port));

    let registry = Arc::new(Registry::default());
    let database = Arc::new(Database::new(config.database.url(), registry.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::graveyard()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("Logged in as {} ({})", ready.user.name, ready.user.id);
                info!("Loaded {} leaderboards", registry.len());

                match database.check_connection().await {
                    Ok(()) => info!("Database connection successful"),
                    Err(e) => error!("Database connection failed: {}", e),
                }

                Ok(Data {
                    registry,
                    database,
                    cooldown: Cooldown::with_default_window(clock.clone()),
                    clock,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await;

    let mut client = match client {
        Ok(client) => client,
        Err(e) => {
            error!("Error creating client: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Discord Leaderboard Bot...");

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }
}
