//! slircbot - Straylight IRC Bot
//!
//! A modular event-dispatch bot host. The connection runtime decodes
//! server lines into [`Message`] events; the [`Bot`] routes each event
//! through the hook tables of loaded modules. Modules load in config
//! order, publish services to one another through the registry, and are
//! isolated at dispatch: one failing hook never stops delivery to the
//! rest.
//!
//! The wire layer (parsing, identity, framing) lives in the `slirc-line`
//! crate and is re-exported here.

pub mod bot;
pub mod config;
pub mod conn;
pub mod error;
pub mod hooks;
pub mod module;
pub mod modules;
pub mod outbound;
pub mod registry;

pub use bot::{Bot, DispatchReport, HookFailure};
pub use config::{BotConfig, Config, ConfigError, ConnectionConfig, ModuleConfigStore};
pub use conn::Connection;
pub use error::{BotError, BotResult};
pub use hooks::{ChatCommand, ChatConvention, HookDecl, HookRegistry, HookRule};
pub use module::{Module, ModuleFactory, ModuleInit};
pub use outbound::Outbound;
pub use registry::{ModuleInfo, ModuleRegistry};

pub use slirc_line::{Message, Source};
