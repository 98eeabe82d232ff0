//! The [`Message`] type: one decoded protocol line.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::source::Source;
use crate::split::{split_args, MAX_PROTOCOL_ARGS};

/// One decoded protocol line.
///
/// `args` holds the fixed positional parameters and never includes the
/// trailing field. `trailing` distinguishes a missing trailing parameter
/// (`None`) from a present-but-empty one (`Some("")`); the distinction is
/// what makes decode-then-encode lossless.
///
/// # Example
///
/// ```
/// use slirc_line::Message;
///
/// let msg = Message::parse(":nick!user@host PRIVMSG #chan :hello world")?;
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.args, ["#chan"]);
/// assert_eq!(msg.trailing.as_deref(), Some("hello world"));
/// assert_eq!(msg.source.nick(), Some("nick"));
/// # Ok::<(), slirc_line::DecodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender of the line, [`Source::Unknown`] when no prefix was present.
    pub source: Source,
    /// Protocol verb or numeric reply code, exactly as it appeared.
    pub command: String,
    /// Positional parameters.
    pub args: Vec<String>,
    /// Free-form final parameter.
    pub trailing: Option<String>,
}

impl Message {
    /// Build a message with no source and no parameters.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            source: Source::Unknown,
            command: command.into(),
            args: Vec::new(),
            trailing: None,
        }
    }

    /// Append one positional argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the trailing text.
    #[must_use]
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// A PRIVMSG to a channel or nick.
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("PRIVMSG").with_arg(target).with_trailing(text)
    }

    /// A NOTICE to a channel or nick.
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("NOTICE").with_arg(target).with_trailing(text)
    }

    /// A JOIN for one channel.
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new("JOIN").with_arg(channel)
    }

    /// A PART from one channel.
    pub fn part(channel: impl Into<String>) -> Self {
        Self::new("PART").with_arg(channel)
    }

    /// A QUIT with a reason.
    pub fn quit(reason: impl Into<String>) -> Self {
        Self::new("QUIT").with_trailing(reason)
    }

    /// A NICK change request.
    pub fn nick(nick: impl Into<String>) -> Self {
        Self::new("NICK").with_arg(nick)
    }

    /// A USER registration line.
    pub fn user(username: impl Into<String>, realname: impl Into<String>) -> Self {
        Self::new("USER")
            .with_arg(username)
            .with_arg("0")
            .with_arg("*")
            .with_trailing(realname)
    }

    /// A PASS line carrying the server password.
    pub fn pass(password: impl Into<String>) -> Self {
        Self::new("PASS").with_arg(password)
    }

    /// A PING carrying a token.
    pub fn ping(token: impl Into<String>) -> Self {
        Self::new("PING").with_trailing(token)
    }

    /// A PONG answering a token.
    pub fn pong(token: impl Into<String>) -> Self {
        Self::new("PONG").with_trailing(token)
    }

    /// Decode one raw line. The CR LF terminator must already be stripped.
    pub fn parse(line: &str) -> Result<Self, DecodeError> {
        if line.is_empty() {
            return Err(DecodeError::Empty);
        }

        let (source, rest) = match line.strip_prefix(':') {
            Some(after) => match after.split_once(' ') {
                Some((token, rest)) => (Source::parse(token), rest),
                None => return Err(DecodeError::MissingCommand(line.to_string())),
            },
            None => (Source::Unknown, line),
        };

        let rest = rest.trim_start_matches(' ');
        let (command, params) = match rest.split_once(' ') {
            Some((command, params)) => (command, params),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(DecodeError::MissingCommand(line.to_string()));
        }

        let (args, trailing) = split_args(params, MAX_PROTOCOL_ARGS);
        Ok(Self {
            source,
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            trailing: trailing.map(str::to_string),
        })
    }

    /// Where a bot should send a reply: the channel the message was
    /// addressed to, or the sender's nick for private messages.
    pub fn reply_target(&self) -> Option<&str> {
        match self.args.first() {
            Some(target) if is_channel_name(target) => Some(target),
            _ => self.source.nick(),
        }
    }
}

/// Whether `name` is a channel name (`#`, `&`, `+`, or `!` sigil).
pub fn is_channel_name(name: &str) -> bool {
    name.starts_with(['#', '&', '+', '!'])
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = self.source.raw() {
            write!(f, ":{raw} ")?;
        }
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}

impl FromStr for Message {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
