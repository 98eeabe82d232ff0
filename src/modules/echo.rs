//! Repeats whatever follows the `echo` chat command.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use slirc_line::Message;

use crate::bot::Bot;
use crate::hooks::{ChatCommand, HookDecl};
use crate::module::{Module, ModuleFactory};

/// The factory for the `echo` module kind.
pub fn factory() -> ModuleFactory {
    Box::new(|init| Ok(Arc::new(Echo { bot: init.bot })))
}

struct Echo {
    bot: Bot,
}

impl Echo {
    async fn echo(&self, msg: &Message, command: &ChatCommand) -> anyhow::Result<()> {
        let Some(target) = msg.reply_target() else {
            return Ok(());
        };
        let text = command.rest();
        if text.is_empty() {
            self.bot.outbound().privmsg(target, "usage: echo <text>").await
        } else {
            self.bot.outbound().privmsg(target, text).await
        }
    }
}

#[async_trait]
impl Module for Echo {
    fn hooks(&self) -> Vec<HookDecl> {
        vec![HookDecl::chat("echo", "echo")]
    }

    async fn invoke(
        &self,
        method: &str,
        msg: &Message,
        command: Option<&ChatCommand>,
    ) -> anyhow::Result<()> {
        match (method, command) {
            ("echo", Some(command)) => self.echo(msg, command).await,
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

    fn chan_msg(text: &str) -> Message {
        Message::parse(&format!(":alice!a@host PRIVMSG #chan :{text}")).unwrap()
    }

    #[tokio::test]
    async fn echoes_back_to_the_channel() {
        let (bot, mut rx) = Bot::new(&BotConfig::default());
        bot.load("echo", factory()).unwrap();

        bot.dispatch(&chan_msg("!echo hello there")).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.to_string(), "PRIVMSG #chan :hello there");
    }

    #[tokio::test]
    async fn empty_command_prints_usage() {
        let (bot, mut rx) = Bot::new(&BotConfig::default());
        bot.load("echo", factory()).unwrap();

        bot.dispatch(&chan_msg("!echo")).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.to_string(), "PRIVMSG #chan :usage: echo <text>");
    }

    #[tokio::test]
    async fn replies_privately_to_direct_messages() {
        let (bot, mut rx) = Bot::new(&BotConfig::default());
        bot.load("echo", factory()).unwrap();

        let msg = Message::parse(":alice!a@host PRIVMSG slircbot :!echo hi").unwrap();
        bot.dispatch(&msg).await;
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.to_string(), "PRIVMSG alice :hi");
    }
}
