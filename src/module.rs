//! The module contract.
//!
//! A module is an independently loadable unit: constructed with the host
//! handle, its own name, and its configuration blob; it declares provided
//! services and a table of hook rules bound to named methods; it may run
//! background tasks it must stop in [`Module::disable`].

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use slirc_line::Message;

use crate::bot::Bot;
use crate::hooks::{ChatCommand, HookDecl};

/// Construction context handed to a module factory.
pub struct ModuleInit {
    /// Handle to the host. Modules keep a clone for registry queries and
    /// outbound sends.
    pub bot: Bot,
    /// The name this module is being loaded under.
    pub name: String,
    /// The module's configuration blob, an empty table when no config file
    /// exists.
    pub config: toml::Value,
}

/// Factory invoked by [`Bot::load`](crate::bot::Bot::load).
///
/// Factories run on the load path and must not block on network I/O; a
/// slow factory delays every subsequent load.
pub type ModuleFactory = Box<dyn FnOnce(ModuleInit) -> anyhow::Result<Arc<dyn Module>> + Send>;

/// An independently loadable extension unit.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// The declarative hook table, registered in order at load.
    fn hooks(&self) -> Vec<HookDecl>;

    /// Service names this module provides. Empty by default.
    fn services(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Invoke the hook method named in a matched [`HookDecl`].
    ///
    /// `command` is the parsed invocation for chat-command rules, `None`
    /// otherwise. Implementations return an error for method names they
    /// never declared. Errors are captured per callback by the dispatcher
    /// and never stop delivery to other hooks.
    async fn invoke(
        &self,
        method: &str,
        msg: &Message,
        command: Option<&ChatCommand>,
    ) -> anyhow::Result<()>;

    /// Release owned resources and stop background tasks.
    ///
    /// Runs once when the module is unloaded, before its hooks are
    /// removed. A failure here is recorded but never blocks the unload.
    async fn disable(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Downcast support for service consumers holding `Arc<dyn Module>`.
    fn as_any(&self) -> &dyn Any;
}
