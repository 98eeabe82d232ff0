//! Outbound send handle.
//!
//! Modules never touch the socket. They queue [`Message`] frames on this
//! handle and the connection runtime drains them into the write half. The
//! handle is injected at module construction through
//! [`ModuleInit`](crate::module::ModuleInit).

use slirc_line::Message;
use tokio::sync::mpsc;

/// Queue handle for outbound protocol lines.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::Sender<Message>,
}

impl Outbound {
    /// Create a handle and the receiver the connection runtime drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue one frame, composed of a command, ordered args, and optional
    /// trailing text.
    pub async fn send(&self, msg: Message) -> anyhow::Result<()> {
        self.tx.send(msg).await?;
        Ok(())
    }

    /// Queue a PRIVMSG to a channel or nick.
    pub async fn privmsg(
        &self,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> anyhow::Result<()> {
        self.send(Message::privmsg(target, text)).await
    }

    /// Queue a NOTICE to a channel or nick.
    pub async fn notice(
        &self,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> anyhow::Result<()> {
        self.send(Message::notice(target, text)).await
    }

    /// Queue a JOIN.
    pub async fn join(&self, channel: impl Into<String>) -> anyhow::Result<()> {
        self.send(Message::join(channel)).await
    }

    /// Queue a PART.
    pub async fn part(&self, channel: impl Into<String>) -> anyhow::Result<()> {
        self.send(Message::part(channel)).await
    }

    /// Queue a QUIT with a reason.
    pub async fn quit(&self, reason: impl Into<String>) -> anyhow::Result<()> {
        self.send(Message::quit(reason)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_reaches_receiver() {
        let (out, mut rx) = Outbound::channel(8);
        out.send(Message::ping("abc")).await.unwrap();
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.to_string(), "PING :abc");
    }

    #[tokio::test]
    async fn helpers_compose_frames() {
        let (out, mut rx) = Outbound::channel(8);
        out.privmsg("#chan", "hello").await.unwrap();
        out.notice("nick", "psst").await.unwrap();
        out.join("#other").await.unwrap();
        out.quit("bye").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().to_string(), "PRIVMSG #chan :hello");
        assert_eq!(rx.recv().await.unwrap().to_string(), "NOTICE nick :psst");
        assert_eq!(rx.recv().await.unwrap().to_string(), "JOIN #other");
        assert_eq!(rx.recv().await.unwrap().to_string(), "QUIT :bye");
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drop() {
        let (out, rx) = Outbound::channel(8);
        drop(rx);
        assert!(out.send(Message::ping("abc")).await.is_err());
    }
}
