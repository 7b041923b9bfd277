use anyhow::{Context, Result};
use serenity::all::{ApplicationId, Client, GatewayIntents};

use centcom::config::Config;
use centcom::discord::Handler;
use centcom::logging;

/// Main entry point for the bot.
///
/// Configuration validation is the only fatal path in the system: once the
/// gateway connection is up, handler failures are contained per-interaction
/// by the dispatch core.
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.toml")?;
    logging::init(&config.log)?;

    // Panics outside the dispatch boundary (background tasks, the gateway
    // loop itself) still get a log line before the runtime unwinds them.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("panic: {panic_info}");
    }));

    log::info!("Starting centcom");

    let handler = Handler::new(&config)?;

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.bot_token, intents)
        .application_id(ApplicationId::new(config.application_id))
        .event_handler(handler)
        .await
        .context("failed to build Discord client")?;

    client.start().await.context("gateway connection failed")?;

    Ok(())
}
