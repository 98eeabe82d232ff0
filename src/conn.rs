//! Connection runtime: socket, registration, read loop, reconnection.
//!
//! Owns the single dispatch path: each decoded line is fully dispatched
//! before the next is read, so hook callbacks never overlap and module
//! loads can safely happen between lines. Outbound frames queued by
//! modules drain through the same loop.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use slirc_line::{LineCodec, Message, MessageCodec, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

use crate::bot::Bot;
use crate::config::ConnectionConfig;

const RECONNECT_MIN: Duration = Duration::from_secs(5);
const RECONNECT_MAX: Duration = Duration::from_secs(300);
const KEEPALIVE_PERIOD: Duration = Duration::from_secs(240);

/// The persistent server connection.
pub struct Connection {
    config: ConnectionConfig,
    bot: Bot,
    outbound_rx: mpsc::Receiver<Message>,
}

impl Connection {
    /// Build the runtime. `outbound_rx` is the receiver half returned by
    /// [`Bot::new`].
    pub fn new(config: ConnectionConfig, bot: Bot, outbound_rx: mpsc::Receiver<Message>) -> Self {
        Self {
            config,
            bot,
            outbound_rx,
        }
    }

    /// Run forever, reconnecting with capped exponential backoff. The
    /// backoff resets once a connection reaches registration.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut backoff = RECONNECT_MIN;
        loop {
            match self.run_once().await {
                Ok(registered) => {
                    if registered {
                        backoff = RECONNECT_MIN;
                    }
                    info!("disconnected from server");
                }
                Err(error) => warn!(error = %error, "connection failed"),
            }
            info!(delay_secs = backoff.as_secs(), "reconnecting");
            sleep(backoff).await;
            backoff = (backoff * 2).min(RECONNECT_MAX);
        }
    }

    /// One connection attempt. Returns whether registration completed.
    async fn run_once(&mut self) -> anyhow::Result<bool> {
        info!(
            host = %self.config.host,
            port = self.config.port,
            tls = self.config.tls,
            "connecting"
        );
        let stream = TcpStream::connect((self.config.host.as_str(), self.config.port)).await?;
        if self.config.tls {
            let connector = tls_connector()?;
            let name = ServerName::try_from(self.config.host.clone())?;
            let stream = connector.connect(name, stream).await?;
            self.drive(stream).await
        } else {
            self.drive(stream).await
        }
    }

    /// Read/dispatch/write loop over an established stream.
    #[instrument(skip(self, stream), fields(host = %self.config.host), name = "connection")]
    async fn drive<S>(&mut self, stream: S) -> anyhow::Result<bool>
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut lines = FramedRead::new(read_half, LineCodec::new());
        let mut sink = FramedWrite::new(write_half, MessageCodec::new());

        let config = &self.config;
        let bot = &self.bot;
        let outbound_rx = &mut self.outbound_rx;

        let mut nick = config.nick.clone();
        if let Some(password) = &config.password {
            sink.send(Message::pass(password.clone())).await?;
        }
        sink.send(Message::nick(nick.clone())).await?;
        sink.send(Message::user(config.username.clone(), config.realname.clone())).await?;
        bot.set_nick(&nick);

        let mut registered = false;
        let mut keepalive = interval(KEEPALIVE_PERIOD);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        keepalive.reset();

        loop {
            tokio::select! {
                line = lines.next() => {
                    let Some(line) = line else {
                        info!("server closed the connection");
                        return Ok(registered);
                    };
                    let line = match line {
                        Ok(line) => line,
                        Err(ProtocolError::Io(error)) => return Err(error.into()),
                        Err(error) => {
                            warn!(error = %error, "framing error, line skipped");
                            continue;
                        }
                    };
                    let msg = match Message::parse(&line) {
                        Ok(msg) => msg,
                        Err(error) => {
                            warn!(line = %line, error = %error, "undecodable line skipped");
                            continue;
                        }
                    };

                    match msg.command.as_str() {
                        "PING" => {
                            let token = msg
                                .trailing
                                .clone()
                                .or_else(|| msg.args.first().cloned())
                                .unwrap_or_default();
                            sink.send(Message::pong(token)).await?;
                        }
                        "001" => {
                            registered = true;
                            if let Some(acquired) = msg.args.first() {
                                nick = acquired.clone();
                                bot.set_nick(&nick);
                            }
                            info!(nick = %nick, "registered with server");
                            for channel in &config.channels {
                                sink.send(Message::join(channel.clone())).await?;
                            }
                        }
                        // Nick collision before registration: append and retry.
                        "433" if !registered => {
                            nick.push('_');
                            bot.set_nick(&nick);
                            debug!(nick = %nick, "nick in use, retrying");
                            sink.send(Message::nick(nick.clone())).await?;
                        }
                        "NICK" => {
                            if msg.source.nick() == Some(nick.as_str()) {
                                if let Some(new) = msg
                                    .trailing
                                    .as_deref()
                                    .or_else(|| msg.args.first().map(String::as_str))
                                {
                                    nick = new.to_string();
                                    bot.set_nick(&nick);
                                }
                            }
                        }
                        _ => {}
                    }

                    let report = bot.dispatch(&msg).await;
                    if !report.failures.is_empty() {
                        debug!(
                            command = %msg.command,
                            failures = report.failures.len(),
                            "dispatch completed with hook failures"
                        );
                    }
                }
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else {
                        return Ok(registered);
                    };
                    sink.send(frame).await?;
                }
                _ = keepalive.tick() => {
                    let token = format!("slircbot-{}", chrono::Utc::now().timestamp());
                    sink.send(Message::ping(token)).await?;
                }
            }
        }
    }
}

/// A TLS connector verifying against the platform's native roots.
fn tls_connector() -> anyhow::Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(error = %error, "native root certificate skipped");
    }
    for cert in native.certs {
        if let Err(error) = roots.add(cert) {
            warn!(error = %error, "root certificate rejected");
        }
    }
    if roots.is_empty() {
        anyhow::bail!("no usable native root certificates");
    }
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;

    async fn expect_line<R>(lines: &mut FramedRead<R, LineCodec>, wanted: &str)
    where
        R: AsyncRead + Unpin,
    {
        let line = lines.next().await.expect("stream open").expect("clean frame");
        assert_eq!(line, wanted);
    }

    #[tokio::test]
    async fn registration_join_and_ping_flow() {
        let (client, server) = tokio::io::duplex(4096);
        let (bot, rx) = Bot::new(&BotConfig::default());
        let mut conn = Connection::new(
            ConnectionConfig {
                channels: vec!["#test".to_string()],
                ..ConnectionConfig::default()
            },
            bot,
            rx,
        );
        let task = tokio::spawn(async move { conn.drive(client).await });

        let (srv_read, srv_write) = tokio::io::split(server);
        let mut srv_lines = FramedRead::new(srv_read, LineCodec::new());
        let mut srv_sink = FramedWrite::new(srv_write, MessageCodec::new());

        expect_line(&mut srv_lines, "NICK slircbot").await;
        expect_line(&mut srv_lines, "USER slircbot 0 * :Straylight IRC bot").await;

        srv_sink
            .send(Message::parse(":irc.test 001 slircbot :Welcome").unwrap())
            .await
            .unwrap();
        expect_line(&mut srv_lines, "JOIN #test").await;

        srv_sink.send(Message::parse("PING :abc").unwrap()).await.unwrap();
        expect_line(&mut srv_lines, "PONG :abc").await;

        drop(srv_lines);
        drop(srv_sink);
        let registered = task.await.unwrap().unwrap();
        assert!(registered);
    }

    #[tokio::test]
    async fn nick_collision_appends_underscore() {
        let (client, server) = tokio::io::duplex(4096);
        let (bot, rx) = Bot::new(&BotConfig::default());
        let handle = bot.clone();
        let mut conn = Connection::new(ConnectionConfig::default(), bot, rx);
        let task = tokio::spawn(async move { conn.drive(client).await });

        let (srv_read, srv_write) = tokio::io::split(server);
        let mut srv_lines = FramedRead::new(srv_read, LineCodec::new());
        let mut srv_sink = FramedWrite::new(srv_write, MessageCodec::new());

        expect_line(&mut srv_lines, "NICK slircbot").await;
        expect_line(&mut srv_lines, "USER slircbot 0 * :Straylight IRC bot").await;

        srv_sink
            .send(Message::parse(":irc.test 433 * slircbot :Nickname is already in use").unwrap())
            .await
            .unwrap();
        expect_line(&mut srv_lines, "NICK slircbot_").await;

        srv_sink
            .send(Message::parse(":irc.test 001 slircbot_ :Welcome").unwrap())
            .await
            .unwrap();

        drop(srv_lines);
        drop(srv_sink);
        let registered = task.await.unwrap().unwrap();
        assert!(registered);
        assert_eq!(handle.nick(), "slircbot_");
    }

    #[tokio::test]
    async fn outbound_frames_reach_the_wire() {
        let (client, server) = tokio::io::duplex(4096);
        let (bot, rx) = Bot::new(&BotConfig::default());
        let handle = bot.clone();
        let mut conn = Connection::new(ConnectionConfig::default(), bot, rx);
        let task = tokio::spawn(async move { conn.drive(client).await });

        let (srv_read, srv_write) = tokio::io::split(server);
        let mut srv_lines = FramedRead::new(srv_read, LineCodec::new());

        expect_line(&mut srv_lines, "NICK slircbot").await;
        expect_line(&mut srv_lines, "USER slircbot 0 * :Straylight IRC bot").await;

        handle.outbound().privmsg("#chan", "from a module").await.unwrap();
        expect_line(&mut srv_lines, "PRIVMSG #chan :from a module").await;

        drop(srv_lines);
        drop(srv_write);
        task.await.unwrap().unwrap();
    }
}
