//! Hook rules, chat-command parsing, and the hook registry.
//!
//! Modules declare interest in events through three rule disciplines:
//!
//! - [`HookRule::Command`]: exact protocol command (verb or numeric reply
//!   code), ASCII case-insensitive.
//! - [`HookRule::Pattern`]: regex over the trailing text, or over the
//!   space-joined args when trailing is absent.
//! - [`HookRule::ChatCommand`]: trigger-word invocation inside PRIVMSG
//!   trailing text, split with the same rules as protocol parameters.
//!
//! Rules live in the [`HookRegistry`] for the owning module's load period
//! and match in global registration order across modules.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use slirc_line::{is_channel_name, split_args, Message, MAX_COMMAND_ARGS};

use crate::module::Module;

// ============================================================================
// Chat-Command Parsing
// ============================================================================

/// Conventions for recognizing chat-command invocations.
#[derive(Debug, Clone, Copy)]
pub struct ChatConvention {
    /// Punctuation character that marks an invocation.
    pub trigger: char,
    /// Match command words case-insensitively.
    pub case_insensitive: bool,
}

impl Default for ChatConvention {
    fn default() -> Self {
        Self {
            trigger: '!',
            case_insensitive: false,
        }
    }
}

/// A parsed chat-command invocation.
///
/// Produced from the trailing text of a message event: the trigger
/// character is stripped, the first token becomes the command name, and the
/// remainder splits like protocol parameters, capped at one positional
/// argument before the free-form rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCommand {
    /// The command token as typed, without the trigger character.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<String>,
    /// Free-form remainder. Absent when nothing followed the arguments.
    pub trailing: Option<String>,
}

impl ChatCommand {
    /// Parse `text` as an invocation, `None` when it is not one.
    ///
    /// Text that does not start with the trigger, or carries nothing after
    /// it, is not an invocation. A space directly after the trigger also
    /// disqualifies the text.
    pub fn parse(text: &str, trigger: char) -> Option<Self> {
        let rest = text.strip_prefix(trigger)?;
        let (name, params) = match rest.split_once(' ') {
            Some((name, params)) => (name, params),
            None => (rest, ""),
        };
        if name.is_empty() {
            return None;
        }
        let (args, trailing) = split_args(params, MAX_COMMAND_ARGS);
        Some(Self {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            trailing: trailing.map(str::to_string),
        })
    }

    /// Whether the invocation carried any argument tokens or trailing text.
    pub fn has_args(&self) -> bool {
        !self.args.is_empty() || self.trailing.is_some()
    }

    /// The full argument text, positional args and trailing rejoined.
    pub fn rest(&self) -> String {
        let mut out = self.args.join(" ");
        if let Some(trailing) = &self.trailing {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(trailing);
        }
        out
    }
}

// ============================================================================
// Hook Rules
// ============================================================================

/// One declared interest rule.
#[derive(Debug, Clone)]
pub enum HookRule {
    /// Exact protocol command match, ASCII case-insensitive.
    Command(String),
    /// Regex over trailing text, or over the space-joined args when
    /// trailing is absent.
    Pattern(Regex),
    /// Trigger-word command inside PRIVMSG trailing text.
    ChatCommand {
        /// Command word to match.
        word: String,
        /// Only match invocations carrying at least one argument token or
        /// trailing text.
        require_args: bool,
        /// Also match invocations sent directly to the bot rather than to
        /// a channel.
        allow_private: bool,
    },
}

impl HookRule {
    fn matches(
        &self,
        msg: &Message,
        chat: Option<&ChatCommand>,
        convention: ChatConvention,
    ) -> bool {
        match self {
            HookRule::Command(name) => msg.command.eq_ignore_ascii_case(name),
            HookRule::Pattern(regex) => match &msg.trailing {
                Some(trailing) => regex.is_match(trailing),
                None => regex.is_match(&msg.args.join(" ")),
            },
            HookRule::ChatCommand {
                word,
                require_args,
                allow_private,
            } => {
                let Some(cmd) = chat else {
                    return false;
                };
                let word_matches = if convention.case_insensitive {
                    cmd.name.eq_ignore_ascii_case(word)
                } else {
                    cmd.name == *word
                };
                if !word_matches {
                    return false;
                }
                if *require_args && !cmd.has_args() {
                    return false;
                }
                if !*allow_private {
                    let in_channel = msg.args.first().is_some_and(|t| is_channel_name(t));
                    if !in_channel {
                        return false;
                    }
                }
                true
            }
        }
    }
}

impl fmt::Display for HookRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookRule::Command(name) => write!(f, "command {name}"),
            HookRule::Pattern(regex) => write!(f, "pattern {}", regex.as_str()),
            HookRule::ChatCommand { word, .. } => write!(f, "chat-command {word}"),
        }
    }
}

/// One entry of a module's declarative hook table: a rule bound to a method
/// name the module resolves in [`Module::invoke`].
#[derive(Debug, Clone)]
pub struct HookDecl {
    /// The matching rule.
    pub rule: HookRule,
    /// Method identity within the owning module.
    pub method: &'static str,
}

impl HookDecl {
    /// Hook an exact protocol command.
    pub fn command(name: impl Into<String>, method: &'static str) -> Self {
        Self {
            rule: HookRule::Command(name.into()),
            method,
        }
    }

    /// Hook messages whose text matches `regex`.
    pub fn pattern(regex: Regex, method: &'static str) -> Self {
        Self {
            rule: HookRule::Pattern(regex),
            method,
        }
    }

    /// Hook a trigger-word chat command. Matches everywhere by default.
    pub fn chat(word: impl Into<String>, method: &'static str) -> Self {
        Self {
            rule: HookRule::ChatCommand {
                word: word.into(),
                require_args: false,
                allow_private: true,
            },
            method,
        }
    }

    /// Require at least one argument token or trailing text.
    #[must_use]
    pub fn require_args(mut self) -> Self {
        if let HookRule::ChatCommand { require_args, .. } = &mut self.rule {
            *require_args = true;
        }
        self
    }

    /// Restrict matching to channel-targeted invocations.
    #[must_use]
    pub fn channel_only(mut self) -> Self {
        if let HookRule::ChatCommand { allow_private, .. } = &mut self.rule {
            *allow_private = false;
        }
        self
    }
}

// ============================================================================
// Hook Registry
// ============================================================================

struct HookEntry {
    owner: String,
    method: &'static str,
    rule: HookRule,
    target: Arc<dyn Module>,
}

/// A matched callback target for one event.
pub struct HookMatch {
    /// Name of the owning module.
    pub module: String,
    /// Method identity within the module.
    pub method: &'static str,
    /// Human-readable rule description for failure records.
    pub rule: String,
    /// The parsed invocation, for chat-command rules only.
    pub command: Option<ChatCommand>,
    pub(crate) target: Arc<dyn Module>,
}

/// Ordered collection of hook rules across all loaded modules.
///
/// Entry order is global registration order: modules register their tables
/// in load order, and rules within one table keep their declared order.
/// Removal never renumbers the survivors.
pub struct HookRegistry {
    entries: Vec<HookEntry>,
    convention: ChatConvention,
}

impl HookRegistry {
    /// An empty registry with the given conventions.
    pub fn new(convention: ChatConvention) -> Self {
        Self {
            entries: Vec::new(),
            convention,
        }
    }

    /// Add one rule owned by `owner`. Duplicate rules are allowed and fire
    /// independently.
    pub fn register(&mut self, owner: &str, target: &Arc<dyn Module>, decl: HookDecl) {
        self.entries.push(HookEntry {
            owner: owner.to_string(),
            method: decl.method,
            rule: decl.rule,
            target: Arc::clone(target),
        });
    }

    /// Remove every rule owned by `owner`. Idempotent.
    pub fn unregister_module(&mut self, owner: &str) {
        self.entries.retain(|e| e.owner != owner);
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every matching rule for `msg`, in global registration order.
    ///
    /// Chat-command decomposition runs at most once per event, and only
    /// for message-type events.
    pub fn matches(&self, msg: &Message) -> Vec<HookMatch> {
        let chat = if msg.command.eq_ignore_ascii_case("PRIVMSG") {
            msg.trailing
                .as_deref()
                .and_then(|text| ChatCommand::parse(text, self.convention.trigger))
        } else {
            None
        };

        self.entries
            .iter()
            .filter(|e| e.rule.matches(msg, chat.as_ref(), self.convention))
            .map(|e| HookMatch {
                module: e.owner.clone(),
                method: e.method,
                rule: e.rule.to_string(),
                command: if matches!(e.rule, HookRule::ChatCommand { .. }) {
                    chat.clone()
                } else {
                    None
                },
                target: Arc::clone(&e.target),
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Null;

    #[async_trait]
    impl Module for Null {
        fn hooks(&self) -> Vec<HookDecl> {
            Vec::new()
        }

        async fn invoke(
            &self,
            _method: &str,
            _msg: &Message,
            _command: Option<&ChatCommand>,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn null() -> Arc<dyn Module> {
        Arc::new(Null)
    }

    fn privmsg(target: &str, text: &str) -> Message {
        Message::parse(&format!(":alice!user@host PRIVMSG {target} :{text}")).unwrap()
    }

    #[test]
    fn chat_command_split_vectors() {
        let cmd = ChatCommand::parse("!echo bob asdf", '!').unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.args, ["bob"]);
        assert_eq!(cmd.trailing.as_deref(), Some("asdf"));

        let cmd = ChatCommand::parse("!echo", '!').unwrap();
        assert_eq!(cmd.name, "echo");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.trailing, None);

        assert_eq!(ChatCommand::parse("echo bob", '!'), None);
        assert_eq!(ChatCommand::parse("!", '!'), None);
        assert_eq!(ChatCommand::parse("! echo", '!'), None);
    }

    #[test]
    fn chat_command_rest_rejoins() {
        let cmd = ChatCommand::parse("!echo bob asdf qux", '!').unwrap();
        assert_eq!(cmd.rest(), "bob asdf qux");

        let cmd = ChatCommand::parse("!echo", '!').unwrap();
        assert_eq!(cmd.rest(), "");
    }

    #[test]
    fn chat_command_honors_custom_trigger() {
        assert!(ChatCommand::parse("!echo", '.').is_none());
        let cmd = ChatCommand::parse(".echo hi", '.').unwrap();
        assert_eq!(cmd.name, "echo");
    }

    #[test]
    fn command_rule_is_case_insensitive() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::command("privmsg", "on_msg"));
        assert_eq!(reg.matches(&privmsg("#chan", "hi")).len(), 1);
    }

    #[test]
    fn pattern_rule_prefers_trailing() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        let url = Regex::new(r"https?://\S+").unwrap();
        reg.register("m", &null(), HookDecl::pattern(url, "on_url"));
        assert_eq!(reg.matches(&privmsg("#chan", "see https://example.org")).len(), 1);
        assert!(reg.matches(&privmsg("#chan", "no links here")).is_empty());
    }

    #[test]
    fn pattern_rule_falls_back_to_joined_args() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        let opped = Regex::new(r"\+o").unwrap();
        reg.register("m", &null(), HookDecl::pattern(opped, "on_op"));
        let mode = Message::parse(":x!u@h MODE #chan +o alice").unwrap();
        assert_eq!(reg.matches(&mode).len(), 1);
    }

    #[test]
    fn chat_rule_carries_parsed_invocation() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::chat("echo", "echo"));
        let matches = reg.matches(&privmsg("#chan", "!echo hello there"));
        assert_eq!(matches.len(), 1);
        let cmd = matches[0].command.as_ref().expect("invocation attached");
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.rest(), "hello there");
    }

    #[test]
    fn chat_rule_word_case_follows_convention() {
        let mut strict = HookRegistry::new(ChatConvention::default());
        strict.register("m", &null(), HookDecl::chat("echo", "echo"));
        assert!(strict.matches(&privmsg("#chan", "!ECHO hi")).is_empty());

        let relaxed = ChatConvention {
            case_insensitive: true,
            ..ChatConvention::default()
        };
        let mut reg = HookRegistry::new(relaxed);
        reg.register("m", &null(), HookDecl::chat("echo", "echo"));
        assert_eq!(reg.matches(&privmsg("#chan", "!ECHO hi")).len(), 1);
    }

    #[test]
    fn chat_rule_require_args() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::chat("seen", "seen").require_args());
        assert!(reg.matches(&privmsg("#chan", "!seen")).is_empty());
        assert_eq!(reg.matches(&privmsg("#chan", "!seen bob")).len(), 1);
    }

    #[test]
    fn chat_rule_channel_only() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::chat("lasturl", "lasturl").channel_only());
        assert_eq!(reg.matches(&privmsg("#chan", "!lasturl")).len(), 1);
        assert!(reg.matches(&privmsg("botnick", "!lasturl")).is_empty());
    }

    #[test]
    fn chat_rules_ignore_non_message_events() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::chat("echo", "echo"));
        let notice = Message::parse(":x!u@h NOTICE #chan :!echo hi").unwrap();
        assert!(reg.matches(&notice).is_empty());
    }

    #[test]
    fn duplicate_rules_fire_independently() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("m", &null(), HookDecl::command("PRIVMSG", "first"));
        reg.register("m", &null(), HookDecl::command("PRIVMSG", "second"));
        let matches = reg.matches(&privmsg("#chan", "hi"));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].method, "first");
        assert_eq!(matches[1].method, "second");
    }

    #[test]
    fn matches_keep_global_registration_order() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("a", &null(), HookDecl::command("PRIVMSG", "one"));
        reg.register("b", &null(), HookDecl::command("PRIVMSG", "two"));
        reg.register("a", &null(), HookDecl::command("PRIVMSG", "three"));
        let matches = reg.matches(&privmsg("#chan", "hi"));
        let order: Vec<&str> = matches.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(order, ["a", "b", "a"]);
    }

    #[test]
    fn unregister_module_removes_all_rules() {
        let mut reg = HookRegistry::new(ChatConvention::default());
        reg.register("a", &null(), HookDecl::command("PRIVMSG", "one"));
        reg.register("b", &null(), HookDecl::command("PRIVMSG", "two"));
        reg.register("a", &null(), HookDecl::command("JOIN", "three"));
        reg.unregister_module("a");
        assert_eq!(reg.len(), 1);
        reg.unregister_module("a");
        assert_eq!(reg.len(), 1);
    }
}
