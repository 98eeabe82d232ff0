//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::Path;

use slircbot::{Bot, BotConfig, Message};
use tokio::sync::mpsc;

/// A bot with default config. Keep the receiver alive so replies land.
pub fn test_bot() -> (Bot, mpsc::Receiver<Message>) {
    Bot::new(&BotConfig::default())
}

/// A bot whose config and data directories live under `dir`.
pub fn test_bot_in(dir: &Path) -> (Bot, mpsc::Receiver<Message>) {
    let config = BotConfig {
        config_dir: dir.join("config"),
        data_dir: dir.join("data"),
        ..BotConfig::default()
    };
    Bot::new(&config)
}

/// A channel PRIVMSG from `nick`.
pub fn chan_msg(nick: &str, channel: &str, text: &str) -> Message {
    Message::parse(&format!(":{nick}!user@host PRIVMSG {channel} :{text}"))
        .expect("valid test line")
}
