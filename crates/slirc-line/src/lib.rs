//! Line-level IRC message parsing and encoding.
//!
//! `slirc-line` decodes raw protocol lines into [`Message`] values
//! (command, positional arguments, optional trailing text, sender
//! [`Source`]) and encodes them back losslessly. The parameter splitter is
//! shared with trigger-word chat-command parsing in consumers, so both
//! follow the same rules. With the default `tokio` feature the crate also
//! provides framing codecs for use with `tokio_util::codec`.
//!
//! # Quick Start
//!
//! ```
//! use slirc_line::Message;
//!
//! let msg = Message::parse(":nick!user@host PRIVMSG #chan :hello world")?;
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.reply_target(), Some("#chan"));
//!
//! let out = Message::privmsg("#chan", "hi");
//! assert_eq!(out.to_string(), "PRIVMSG #chan :hi");
//! # Ok::<(), slirc_line::DecodeError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod source;
pub mod split;

#[cfg(feature = "tokio")]
pub mod codec;

pub use error::{DecodeError, ProtocolError, Result};
pub use message::{is_channel_name, Message};
pub use source::{irc_to_lower, Source};
pub use split::{split_args, SplitArgs, MAX_COMMAND_ARGS, MAX_PROTOCOL_ARGS};

#[cfg(feature = "tokio")]
pub use codec::{LineCodec, MessageCodec, MAX_LINE_LEN};
