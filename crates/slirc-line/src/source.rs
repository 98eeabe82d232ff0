//! Sender identity decoding.
//!
//! The prefix token of a protocol line names the entity a message came
//! from: `nick!user@host` for users, a bare hostname for servers. Decoding
//! is purely syntactic and never fails; tokens that do not fit the user
//! shape degrade to server identities with the original text preserved.

/// The decoded sender of a protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A user prefix of the form `nick!user@host`.
    User {
        /// Nickname before the `!`.
        nick: String,
        /// Username between `!` and `@`. Empty for the `nick@host` form.
        user: String,
        /// Hostname after the `@`.
        host: String,
        /// The prefix token exactly as received.
        raw: String,
    },
    /// A server prefix, or any token that does not decode as a user.
    Server {
        /// The server hostname.
        host: String,
        /// The prefix token exactly as received.
        raw: String,
    },
    /// The line carried no prefix token.
    Unknown,
}

impl Source {
    /// Decode one prefix token.
    ///
    /// A token containing `!` must carry a non-empty nick, user, and host
    /// to decode as a user; `nick@host` decodes as a user with an empty
    /// username. Everything else is a server identity.
    pub fn parse(token: &str) -> Self {
        match token.find('!') {
            Some(bang) => {
                let rest = &token[bang + 1..];
                match rest.find('@') {
                    Some(at) if bang > 0 && at > 0 && at + 1 < rest.len() => Source::User {
                        nick: token[..bang].to_string(),
                        user: rest[..at].to_string(),
                        host: rest[at + 1..].to_string(),
                        raw: token.to_string(),
                    },
                    _ => Source::Server {
                        host: token.to_string(),
                        raw: token.to_string(),
                    },
                }
            }
            None => match token.find('@') {
                Some(at) if at > 0 && at + 1 < token.len() => Source::User {
                    nick: token[..at].to_string(),
                    user: String::new(),
                    host: token[at + 1..].to_string(),
                    raw: token.to_string(),
                },
                _ => Source::Server {
                    host: token.to_string(),
                    raw: token.to_string(),
                },
            },
        }
    }

    /// Nickname for user sources.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Source::User { nick, .. } => Some(nick),
            _ => None,
        }
    }

    /// Hostname for user or server sources.
    pub fn host(&self) -> Option<&str> {
        match self {
            Source::User { host, .. } | Source::Server { host, .. } => Some(host),
            Source::Unknown => None,
        }
    }

    /// The undecoded prefix token, if the line carried one.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Source::User { raw, .. } | Source::Server { raw, .. } => Some(raw),
            Source::Unknown => None,
        }
    }

    /// Whether this is a user source.
    pub fn is_user(&self) -> bool {
        matches!(self, Source::User { .. })
    }

    /// Whether this is a server source.
    pub fn is_server(&self) -> bool {
        matches!(self, Source::Server { .. })
    }
}

/// Lowercase a nickname or channel name under RFC 1459 casemapping, where
/// `[ ] \ ~` are the uppercase forms of `{ } | ^`.
pub fn irc_to_lower(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'A'..='Z' => c.to_ascii_lowercase(),
            '[' => '{',
            ']' => '}',
            '\\' => '|',
            '~' => '^',
            _ => c,
        })
        .collect()
}
