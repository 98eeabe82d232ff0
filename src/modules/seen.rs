//! Answers "when did X last speak?" from recorded channel traffic.
//!
//! Requires a loaded `kvstore` provider; loading fails otherwise.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use slirc_line::{irc_to_lower, is_channel_name, Message};

use crate::bot::Bot;
use crate::error::BotError;
use crate::hooks::{ChatCommand, HookDecl};
use crate::module::{Module, ModuleFactory, ModuleInit};
use crate::modules::storage::{self, Namespace, Storage};

/// The factory for the `seen` module kind.
pub fn factory() -> ModuleFactory {
    Box::new(|init| Ok(Arc::new(Seen::new(&init)?)))
}

struct Seen {
    bot: Bot,
    store: Arc<Namespace>,
}

impl Seen {
    fn new(init: &ModuleInit) -> anyhow::Result<Self> {
        let provider = init
            .bot
            .best_module_for_service(storage::SERVICE)
            .ok_or_else(|| BotError::MissingService(storage::SERVICE.to_string()))?;
        let storage = provider.as_any().downcast_ref::<Storage>().ok_or_else(|| {
            anyhow::anyhow!(
                "service `{}` provider is not the built-in storage module",
                storage::SERVICE
            )
        })?;
        let store = storage.open("seen")?;
        Ok(Self {
            bot: init.bot.clone(),
            store,
        })
    }

    async fn record(&self, msg: &Message) -> anyhow::Result<()> {
        let Some(nick) = msg.source.nick() else {
            return Ok(());
        };
        let Some(target) = msg.args.first() else {
            return Ok(());
        };
        if !is_channel_name(target) {
            return Ok(());
        }
        self.store.set(
            irc_to_lower(nick),
            json!({
                "nick": nick,
                "at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                "channel": target,
                "text": msg.trailing.clone().unwrap_or_default(),
            }),
        );
        Ok(())
    }

    async fn report(&self, msg: &Message, command: &ChatCommand) -> anyhow::Result<()> {
        let Some(target) = msg.reply_target() else {
            return Ok(());
        };
        let Some(who) = command.args.first() else {
            return self.bot.outbound().privmsg(target, "usage: seen <nick>").await;
        };
        let reply = self
            .store
            .get(&irc_to_lower(who))
            .as_ref()
            .and_then(describe)
            .unwrap_or_else(|| format!("I have not seen {who}"));
        self.bot.outbound().privmsg(target, reply).await
    }
}

/// Render a stored sighting, using the nick's original capitalization.
fn describe(entry: &Value) -> Option<String> {
    let nick = entry.get("nick")?.as_str()?;
    let channel = entry.get("channel")?.as_str()?;
    let at = entry.get("at")?.as_str()?;
    let text = entry.get("text").and_then(Value::as_str).unwrap_or_default();
    Some(if text.is_empty() {
        format!("{nick} was last seen in {channel} at {at}")
    } else {
        format!("{nick} was last seen in {channel} at {at}: {text}")
    })
}

#[async_trait]
impl Module for Seen {
    fn hooks(&self) -> Vec<HookDecl> {
        vec![
            HookDecl::command("PRIVMSG", "record"),
            HookDecl::chat("seen", "report").require_args(),
        ]
    }

    async fn invoke(
        &self,
        method: &str,
        msg: &Message,
        command: Option<&ChatCommand>,
    ) -> anyhow::Result<()> {
        match (method, command) {
            ("record", _) => self.record(msg).await,
            ("report", Some(command)) => self.report(msg, command).await,
            _ => anyhow::bail!("unknown hook method `{method}`"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
