//! The module registry: ordered records of loaded modules.
//!
//! Records are kept in load order. `load_order` numbers come from a
//! monotonic counter and are never reused, so unloading never renumbers
//! the survivors and a later load never masquerades as an earlier one.
//! The service directory is derived on demand from the declared services
//! of the loaded records.

use std::sync::Arc;

use crate::error::{BotError, BotResult};
use crate::module::Module;

/// Introspection data for one loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Unique module name.
    pub name: String,
    /// Declared provided services.
    pub services: Vec<&'static str>,
    /// Monotonic load sequence number.
    pub load_order: u64,
}

struct ModuleRecord {
    name: String,
    services: Vec<&'static str>,
    load_order: u64,
    instance: Arc<dyn Module>,
}

/// Ordered collection of loaded modules with service lookup.
#[derive(Default)]
pub struct ModuleRegistry {
    records: Vec<ModuleRecord>,
    next_order: u64,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a module named `name` is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    /// Append a record, assigning the next load order.
    pub fn insert(
        &mut self,
        name: &str,
        instance: Arc<dyn Module>,
        services: Vec<&'static str>,
    ) -> BotResult<u64> {
        if self.contains(name) {
            return Err(BotError::DuplicateModule(name.to_string()));
        }
        let load_order = self.next_order;
        self.next_order += 1;
        self.records.push(ModuleRecord {
            name: name.to_string(),
            services,
            load_order,
            instance,
        });
        Ok(load_order)
    }

    /// Remove the record for `name`, returning its instance.
    pub fn remove(&mut self, name: &str) -> BotResult<Arc<dyn Module>> {
        let idx = self
            .records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| BotError::UnknownModule(name.to_string()))?;
        Ok(self.records.remove(idx).instance)
    }

    /// The instance registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| Arc::clone(&r.instance))
    }

    /// Every provider of `service`, in load order.
    pub fn by_service(&self, service: &str) -> Vec<Arc<dyn Module>> {
        self.records
            .iter()
            .filter(|r| r.services.iter().any(|s| *s == service))
            .map(|r| Arc::clone(&r.instance))
            .collect()
    }

    /// The first-loaded provider of `service`. Deterministic (lowest load
    /// order), not otherwise ranked.
    pub fn best_for_service(&self, service: &str) -> Option<Arc<dyn Module>> {
        self.records
            .iter()
            .find(|r| r.services.iter().any(|s| *s == service))
            .map(|r| Arc::clone(&r.instance))
    }

    /// Introspection snapshot in load order.
    pub fn infos(&self) -> Vec<ModuleInfo> {
        self.records
            .iter()
            .map(|r| ModuleInfo {
                name: r.name.clone(),
                services: r.services.clone(),
                load_order: r.load_order,
            })
            .collect()
    }

    /// Loaded module names in load order.
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no modules are loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
