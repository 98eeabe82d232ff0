//! The bot host: module lifecycle, event dispatch, service discovery.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use slirc_line::Message;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{BotConfig, ModuleConfigStore};
use crate::error::{BotError, BotResult};
use crate::hooks::{ChatConvention, HookRegistry};
use crate::module::{Module, ModuleFactory, ModuleInit};
use crate::outbound::Outbound;
use crate::registry::{ModuleInfo, ModuleRegistry};

/// Record of one failed hook invocation.
#[derive(Debug)]
pub struct HookFailure {
    /// Owning module.
    pub module: String,
    /// Method identity within the module.
    pub method: &'static str,
    /// Description of the matched rule.
    pub rule: String,
    /// The callback's error.
    pub error: anyhow::Error,
}

/// Outcome of dispatching one event.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Callbacks that completed successfully.
    pub delivered: usize,
    /// Captured failures, in invocation order.
    pub failures: Vec<HookFailure>,
}

struct Shared {
    config: BotConfig,
    convention: ChatConvention,
    registry: RwLock<ModuleRegistry>,
    hooks: RwLock<HookRegistry>,
    outbound: Outbound,
    configs: ModuleConfigStore,
    nick: RwLock<String>,
}

/// Cheap-clone handle to the bot host.
///
/// One host exists per process; a clone of this handle is given to every
/// module constructor. It owns the module registry, the hook registry, and
/// the outbound queue. `load` and `unload` must be serialized against
/// `dispatch` by the caller; the connection runtime does so by performing
/// them only between processed lines.
#[derive(Clone)]
pub struct Bot {
    shared: Arc<Shared>,
}

impl Bot {
    /// Build a host from config, returning the outbound frame receiver the
    /// connection runtime drains.
    pub fn new(config: &BotConfig) -> (Self, mpsc::Receiver<Message>) {
        let (outbound, rx) = Outbound::channel(256);
        let convention = ChatConvention {
            trigger: config.trigger,
            case_insensitive: config.commands_case_insensitive,
        };
        let shared = Shared {
            config: config.clone(),
            convention,
            registry: RwLock::new(ModuleRegistry::new()),
            hooks: RwLock::new(HookRegistry::new(convention)),
            outbound,
            configs: ModuleConfigStore::new(config.config_dir.clone()),
            nick: RwLock::new(String::new()),
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            rx,
        )
    }

    // ========================================================================
    // Module lifecycle
    // ========================================================================

    /// Load a module under `name` using `factory`.
    ///
    /// The factory receives a handle clone, the name, and the module's
    /// config blob. On factory failure nothing is registered. On success
    /// the record and the module's hook table land atomically with respect
    /// to dispatch.
    pub fn load(&self, name: &str, factory: ModuleFactory) -> BotResult<()> {
        if self.shared.registry.read().contains(name) {
            return Err(BotError::DuplicateModule(name.to_string()));
        }

        let init = ModuleInit {
            bot: self.clone(),
            name: name.to_string(),
            config: self.shared.configs.get(name),
        };
        let module = factory(init).map_err(|source| BotError::ModuleInit {
            name: name.to_string(),
            source,
        })?;

        let decls = module.hooks();
        let services = module.services();
        let hook_count = decls.len();

        let mut hooks = self.shared.hooks.write();
        let mut registry = self.shared.registry.write();
        let load_order = registry.insert(name, Arc::clone(&module), services)?;
        for decl in decls {
            hooks.register(name, &module, decl);
        }
        drop(registry);
        drop(hooks);

        info!(module = %name, load_order, hooks = hook_count, "module loaded");
        Ok(())
    }

    /// Unload the module registered under `name`.
    ///
    /// The disable callback runs first; its failure is logged and unload
    /// still completes, removing the record and every hook. Callers honor
    /// the consumer-before-provider ordering discipline themselves; the
    /// registry does not track inter-module references.
    pub async fn unload(&self, name: &str) -> BotResult<()> {
        let module = self
            .shared
            .registry
            .read()
            .get(name)
            .ok_or_else(|| BotError::UnknownModule(name.to_string()))?;

        if let Err(error) = module.disable().await {
            warn!(module = %name, error = %error, "disable callback failed");
        }

        let mut hooks = self.shared.hooks.write();
        let mut registry = self.shared.registry.write();
        hooks.unregister_module(name);
        registry.remove(name)?;
        drop(registry);
        drop(hooks);

        info!(module = %name, "module unloaded");
        Ok(())
    }

    /// Unload every module in reverse load order.
    ///
    /// Reverse order satisfies the consumer-before-provider discipline for
    /// dependencies acquired at load time.
    pub async fn shutdown(&self) {
        let mut names = self.shared.registry.read().names();
        names.reverse();
        for name in names {
            if let Err(error) = self.unload(&name).await {
                warn!(module = %name, error = %error, "unload failed during shutdown");
            }
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Dispatch one decoded event to every matching hook, in global
    /// registration order, capturing per-callback failures.
    ///
    /// Callbacks are awaited one at a time; a failure is recorded and
    /// delivery continues with the next match.
    pub async fn dispatch(&self, msg: &Message) -> DispatchReport {
        let matches = self.shared.hooks.read().matches(msg);

        let mut report = DispatchReport::default();
        for m in matches {
            match m.target.invoke(m.method, msg, m.command.as_ref()).await {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(
                        module = %m.module,
                        method = %m.method,
                        rule = %m.rule,
                        error = %error,
                        "hook invocation failed"
                    );
                    report.failures.push(HookFailure {
                        module: m.module,
                        method: m.method,
                        rule: m.rule,
                        error,
                    });
                }
            }
        }
        report
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The loaded module registered under `name`.
    pub fn module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.shared.registry.read().get(name)
    }

    /// Every loaded provider of `service`, in load order.
    pub fn modules_by_service(&self, service: &str) -> Vec<Arc<dyn Module>> {
        self.shared.registry.read().by_service(service)
    }

    /// The first-loaded provider of `service`.
    pub fn best_module_for_service(&self, service: &str) -> Option<Arc<dyn Module>> {
        self.shared.registry.read().best_for_service(service)
    }

    /// Introspection snapshot of loaded modules in load order.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.shared.registry.read().infos()
    }

    /// The chat-command conventions in effect.
    pub fn convention(&self) -> ChatConvention {
        self.shared.convention
    }

    /// Handle for queueing outbound protocol lines.
    pub fn outbound(&self) -> &Outbound {
        &self.shared.outbound
    }

    /// Per-module config store.
    pub fn module_configs(&self) -> &ModuleConfigStore {
        &self.shared.configs
    }

    /// Base directory for module data files.
    pub fn data_dir(&self) -> &Path {
        &self.shared.config.data_dir
    }

    /// The nick the connection currently holds.
    pub fn nick(&self) -> String {
        self.shared.nick.read().clone()
    }

    /// Record the nick acquired or changed by the connection runtime.
    pub fn set_nick(&self, nick: &str) {
        *self.shared.nick.write() = nick.to_string();
    }
}

// ============================================================================
// Tests
// ============================================================================
