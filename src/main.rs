//! slircbot - Straylight IRC Bot
//!
//! Binary entry point: load the config, load the configured modules,
//! then run the connection until a shutdown signal arrives.

use std::time::Duration;

use slircbot::modules::builtin;
use slircbot::{Bot, Config, Connection};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        host = %config.connection.host,
        port = config.connection.port,
        nick = %config.connection.nick,
        modules = config.bot.modules.len(),
        "Starting slircbot"
    );

    let (bot, outbound_rx) = Bot::new(&config.bot);

    // A module that fails to come up is skipped, not fatal.
    for name in &config.bot.modules {
        let factory = match builtin(name) {
            Ok(factory) => factory,
            Err(error) => {
                warn!(module = %name, error = %error, "skipping unknown module kind");
                continue;
            }
        };
        if let Err(error) = bot.load(name, factory) {
            warn!(module = %name, code = error.error_code(), error = %error, "module failed to load");
        }
    }

    let mut connection = Connection::new(config.connection, bot.clone(), outbound_rx);
    let run = connection.run();
    tokio::pin!(run);

    #[cfg(unix)]
    let mut hangup =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?;

    loop {
        #[cfg(unix)]
        tokio::select! {
            result = &mut run => return result,
            _ = tokio::signal::ctrl_c() => break,
            _ = hangup.recv() => {
                let reloaded = bot.module_configs().reload_all();
                info!(reloaded, "module configs reloaded");
            }
        }
        #[cfg(not(unix))]
        tokio::select! {
            result = &mut run => return result,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("shutting down");
    bot.shutdown().await;
    if bot.outbound().quit("shutting down").await.is_ok() {
        // Give the connection a moment to flush the QUIT.
        let _ = tokio::time::timeout(Duration::from_secs(2), &mut run).await;
    }
    Ok(())
}
