//! Watches channel traffic for URLs and recalls the most recent one.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use slirc_line::{irc_to_lower, is_channel_name, Message};

use crate::bot::Bot;
use crate::hooks::{ChatCommand, HookDecl};
use crate::module::{Module, ModuleFactory};

/// The factory for the `links` module kind.
pub fn factory() -> ModuleFactory {
    Box::new(|init| Ok(Arc::new(Links::new(init.bot)?)))
}

struct Links {
    bot: Bot,
    url: Regex,
    last: DashMap<String, String>,
}

impl Links {
    fn new(bot: Bot) -> anyhow::Result<Self> {
        Ok(Self {
            bot,
            url: Regex::new(r"https?://\S+")?,
            last: DashMap::new(),
        })
    }

    fn saw_link(&self, msg: &Message) -> anyhow::Result<()> {
        let Some(target) = msg.args.first() else {
            return Ok(());
        };
        if !is_channel_name(target) {
            return Ok(());
        }
        let Some(text) = msg.trailing.as_deref() else {
            return Ok(());
        };
        if let Some(found) = self.url.find(text) {
            self.last
                .insert(irc_to_lower(target), found.as_str().to_string());
        }
        Ok(())
    }

    async fn last_url(&self, msg: &Message) -> anyhow::Result<()> {
        let Some(target) = msg.args.first() else {
            return Ok(());
        };
        let reply = match self.last.get(&irc_to_lower(target)) {
            Some(url) => format!("last link here: {}", url.value()),
            None => "no links seen here yet".to_string(),
        };
        self.bot.outbound().privmsg(target.as_str(), reply).await
    }
}

#[async_trait]
impl Module for Links {
    fn hooks(&self) -> Vec<HookDecl> {
        vec![
            HookDecl::pattern(self.url.clone(), "saw_link"),
            HookDecl::chat("lasturl", "last_url").channel_only(),
        ]
    }

    async fn invoke(
        &self,
        method: &str,
        msg: &Message,
        _command: Option<&ChatCommand>,
    ) -> anyhow::Result<()> {
        match method {
            "saw_link" => self.saw_link(msg),
            "last_url" => self.last_url(msg).await,
            _ => anyhow::bail!("unknown hook method `{method}`"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
