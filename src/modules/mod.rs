//! Built-in modules.
//!
//! Each submodule exposes a `factory()` returning a [`ModuleFactory`];
//! [`builtin`] maps the config-file module kind to that factory.

use crate::error::{BotError, BotResult};
use crate::module::ModuleFactory;

pub mod echo;
pub mod links;
pub mod quotes;
pub mod seen;
pub mod storage;

/// Look up the factory for a built-in module kind.
pub fn builtin(kind: &str) -> BotResult<ModuleFactory> {
    match kind {
        "echo" => Ok(echo::factory()),
        "links" => Ok(links::factory()),
        "quotes" => Ok(quotes::factory()),
        "seen" => Ok(seen::factory()),
        "storage" => Ok(storage::factory()),
        _ => Err(BotError::UnknownModuleKind(kind.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_an_error() {
        let err = builtin("frobnicator").err().unwrap();
        assert!(matches!(err, BotError::UnknownModuleKind(kind) if kind == "frobnicator"));
    }

    #[test]
    fn known_kinds_resolve() {
        for kind in ["echo", "links", "quotes", "seen", "storage"] {
            assert!(builtin(kind).is_ok(), "missing factory for {kind}");
        }
    }
}
