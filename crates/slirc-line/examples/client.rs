//! Minimal client: connect, register, answer PING, print decoded lines.
//!
//! Usage: cargo run --example client -- irc.libera.chat:6667 mynick

use futures_util::{SinkExt, StreamExt};
use slirc_line::{LineCodec, Message, MessageCodec};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "irc.libera.chat:6667".to_string());
    let nick = args.next().unwrap_or_else(|| "slirc_line_demo".to_string());

    println!("Connecting to {addr} as {nick}...");
    let stream = TcpStream::connect(&addr).await?;
    let (read, write) = stream.into_split();
    let mut lines = FramedRead::new(read, LineCodec::new());
    let mut sink = FramedWrite::new(write, MessageCodec::new());

    sink.send(Message::nick(&nick)).await?;
    sink.send(Message::user(&nick, "slirc-line example client")).await?;

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("framing error: {e}");
                continue;
            }
        };
        match Message::parse(&line) {
            Ok(msg) => {
                if msg.command == "PING" {
                    let token = msg.trailing.clone().unwrap_or_default();
                    sink.send(Message::pong(token)).await?;
                }
                println!("{msg:?}");
            }
            Err(e) => eprintln!("undecodable line: {e}"),
        }
    }

    println!("Server closed the connection");
    Ok(())
}
