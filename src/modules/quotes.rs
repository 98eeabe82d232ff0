//! Remembers recent channel chatter and replays a random line on demand.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde::Deserialize;
use slirc_line::{is_channel_name, Message};

use crate::bot::Bot;
use crate::hooks::{ChatCommand, HookDecl};
use crate::module::{Module, ModuleFactory, ModuleInit};

/// The factory for the `quotes` module kind.
pub fn factory() -> ModuleFactory {
    Box::new(|init| Ok(Arc::new(Quotes::new(init)?)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct QuotesConfig {
    /// How many lines to keep per process.
    limit: usize,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self { limit: 500 }
    }
}

struct Quotes {
    bot: Bot,
    limit: usize,
    lines: Mutex<VecDeque<(String, String)>>,
}

impl Quotes {
    fn new(init: ModuleInit) -> anyhow::Result<Self> {
        let config: QuotesConfig = init.config.try_into()?;
        Ok(Self {
            bot: init.bot,
            limit: config.limit.max(1),
            lines: Mutex::new(VecDeque::new()),
        })
    }

    fn record(&self, msg: &Message) -> anyhow::Result<()> {
        let Some(nick) = msg.source.nick() else {
            return Ok(());
        };
        let Some(target) = msg.args.first() else {
            return Ok(());
        };
        let Some(text) = msg.trailing.as_deref() else {
            return Ok(());
        };
        if !is_channel_name(target) || text.is_empty() {
            return Ok(());
        }
        // Lines addressed to the bot are commands, not quotable chatter.
        if text.starts_with(self.bot.convention().trigger) {
            return Ok(());
        }
        let mut lines = self.lines.lock();
        if lines.len() == self.limit {
            lines.pop_front();
        }
        lines.push_back((nick.to_string(), text.to_string()));
        Ok(())
    }

    async fn random(&self, msg: &Message) -> anyhow::Result<()> {
        let Some(target) = msg.reply_target() else {
            return Ok(());
        };
        let picked = {
            let lines = self.lines.lock();
            if lines.is_empty() {
                None
            } else {
                let idx = rand::thread_rng().gen_range(0..lines.len());
                lines.get(idx).cloned()
            }
        };
        let reply = match picked {
            Some((nick, text)) => format!("<{nick}> {text}"),
            None => "nothing memorable has been said yet".to_string(),
        };
        self.bot.outbound().privmsg(target, reply).await
    }
}

#[async_trait]
impl Module for Quotes {
    fn hooks(&self) -> Vec<HookDecl> {
        vec![
            HookDecl::command("PRIVMSG", "record"),
            HookDecl::chat("randquote", "random"),
            HookDecl::chat("randomquote", "random"),
            HookDecl::chat("rq", "random"),
        ]
    }

    async fn invoke(
        &self,
        method: &str,
        msg: &Message,
        _command: Option<&ChatCommand>,
    ) -> anyhow::Result<()> {
        match method {
            "record" => self.record(msg),
            "random" => self.random(msg).await,
            _ => anyhow::bail!("unknown hook method `{method}`"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;

    fn quotes_with_limit(raw: &str) -> Quotes {
        let (bot, _rx) = Bot::new(&BotConfig::default());
        let init = ModuleInit {
            bot,
            name: "quotes".to_string(),
            config: toml::from_str(raw).unwrap(),
        };
        Quotes::new(init).unwrap()
    }

    fn chan_msg(nick: &str, text: &str) -> Message {
        Message::parse(&format!(":{nick}!u@host PRIVMSG #chan :{text}")).unwrap()
    }

    #[test]
    fn default_limit_applies_to_empty_config() {
        let quotes = quotes_with_limit("");
        assert_eq!(quotes.limit, 500);
    }

    #[test]
    fn zero_limit_is_clamped() {
        let quotes = quotes_with_limit("limit = 0");
        assert_eq!(quotes.limit, 1);
    }

    #[test]
    fn oldest_line_is_evicted_at_the_limit() {
        let quotes = quotes_with_limit("limit = 2");
        quotes.record(&chan_msg("alice", "first")).unwrap();
        quotes.record(&chan_msg("bob", "second")).unwrap();
        quotes.record(&chan_msg("carol", "third")).unwrap();

        let lines = quotes.lines.lock();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], ("bob".to_string(), "second".to_string()));
        assert_eq!(lines[1], ("carol".to_string(), "third".to_string()));
    }

    #[test]
    fn command_lines_are_not_quoted() {
        let quotes = quotes_with_limit("");
        quotes.record(&chan_msg("alice", "!randquote")).unwrap();
        assert!(quotes.lines.lock().is_empty());
    }

    #[test]
    fn private_messages_are_not_quoted() {
        let quotes = quotes_with_limit("");
        let msg = Message::parse(":alice!u@host PRIVMSG slircbot :psst").unwrap();
        quotes.record(&msg).unwrap();
        assert!(quotes.lines.lock().is_empty());
    }
}
