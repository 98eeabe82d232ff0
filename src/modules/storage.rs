//! Shared key/value persistence, discoverable as the `kvstore` service.
//!
//! Other modules obtain the provider through
//! [`Bot::best_module_for_service`](crate::bot::Bot::best_module_for_service)
//! and downcast to [`Storage`]. Each consumer gets a [`Namespace`] backed
//! by one JSON file under the bot's data directory. Writes mark the
//! namespace dirty; a background task flushes dirty namespaces on a
//! fixed period, and `disable` flushes everything a final time.

use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use slirc_line::Message;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::hooks::{ChatCommand, HookDecl};
use crate::module::{Module, ModuleFactory, ModuleInit};

/// Service name this module registers under.
pub const SERVICE: &str = "kvstore";

const FLUSH_PERIOD: Duration = Duration::from_secs(30);

/// The factory for the `storage` module kind.
pub fn factory() -> ModuleFactory {
    Box::new(|init| Ok(Arc::new(Storage::new(&init)?)))
}

/// One named key/value map, persisted as a JSON object.
pub struct Namespace {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
    dirty: AtomicBool,
}

impl Namespace {
    fn open(path: PathBuf) -> anyhow::Result<Self> {
        let data = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("corrupt store file {}", path.display()))?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
            dirty: AtomicBool::new(false),
        })
    }

    /// Fetch a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Insert or replace a value and mark the namespace dirty.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.data.write().insert(key.into(), value);
        self.dirty.store(true, Ordering::Release);
    }

    /// Remove a key, returning the previous value if any.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.data.write().remove(key);
        if removed.is_some() {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the namespace holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Write the namespace to disk if dirty. The file is replaced
    /// atomically through a temp-file rename.
    pub fn persist(&self) -> io::Result<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let text = {
            let data = self.data.read();
            serde_json::to_string_pretty(&*data).map_err(io::Error::other)?
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)
    }
}

type Spaces = Arc<Mutex<HashMap<String, Arc<Namespace>>>>;

/// The `kvstore` service provider.
pub struct Storage {
    dir: PathBuf,
    spaces: Spaces,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl Storage {
    fn new(init: &ModuleInit) -> anyhow::Result<Self> {
        let dir = init.bot.data_dir().join(&init.name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
        let spaces: Spaces = Arc::new(Mutex::new(HashMap::new()));
        let flusher = tokio::spawn(flush_loop(Arc::clone(&spaces)));
        Ok(Self {
            dir,
            spaces,
            flusher: Mutex::new(Some(flusher)),
        })
    }

    /// Open (or create) a namespace. Repeated calls with the same name
    /// return the same instance.
    pub fn open(&self, name: &str) -> anyhow::Result<Arc<Namespace>> {
        let mut spaces = self.spaces.lock();
        if let Some(namespace) = spaces.get(name) {
            return Ok(Arc::clone(namespace));
        }
        let namespace = Arc::new(Namespace::open(self.dir.join(format!("{name}.json")))?);
        spaces.insert(name.to_string(), Arc::clone(&namespace));
        Ok(namespace)
    }
}

fn persist_snapshot(spaces: &Spaces) {
    let snapshot: Vec<(String, Arc<Namespace>)> = spaces
        .lock()
        .iter()
        .map(|(name, namespace)| (name.clone(), Arc::clone(namespace)))
        .collect();
    for (name, namespace) in snapshot {
        if let Err(error) = namespace.persist() {
            warn!(namespace = %name, error = %error, "failed to persist store");
        }
    }
}

async fn flush_loop(spaces: Spaces) {
    let mut tick = interval(FLUSH_PERIOD);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tick.tick().await;
        persist_snapshot(&spaces);
    }
}

#[async_trait]
impl Module for Storage {
    fn hooks(&self) -> Vec<HookDecl> {
        Vec::new()
    }

    fn services(&self) -> Vec<&'static str> {
        vec![SERVICE]
    }

    async fn invoke(
        &self,
        method: &str,
        _msg: &Message,
        _command: Option<&ChatCommand>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("unknown hook method `{method}`")
    }

    async fn disable(&self) -> anyhow::Result<()> {
        if let Some(handle) = self.flusher.lock().take() {
            handle.abort();
        }
        persist_snapshot(&self.spaces);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Bot;
    use crate::config::BotConfig;
    use serde_json::json;

    #[test]
    fn namespace_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ns.json");

        let namespace = Namespace::open(path.clone()).unwrap();
        namespace.set("greeting", json!("hello"));
        namespace.set("count", json!(3));
        namespace.persist().unwrap();

        let reopened = Namespace::open(path).unwrap();
        assert_eq!(reopened.get("greeting"), Some(json!("hello")));
        assert_eq!(reopened.get("count"), Some(json!(3)));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn persist_skips_clean_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ns.json");

        let namespace = Namespace::open(path.clone()).unwrap();
        namespace.set("k", json!(1));
        namespace.persist().unwrap();
        assert!(path.exists());

        fs::remove_file(&path).unwrap();
        namespace.persist().unwrap();
        assert!(!path.exists(), "clean namespace must not rewrite its file");
    }

    #[test]
    fn remove_marks_dirty_only_on_hit() {
        let dir = tempfile::tempdir().unwrap();
        let namespace = Namespace::open(dir.path().join("ns.json")).unwrap();
        namespace.set("k", json!(1));
        namespace.persist().unwrap();

        assert!(namespace.remove("missing").is_none());
        assert!(!namespace.dirty.load(Ordering::Acquire));

        assert_eq!(namespace.remove("k"), Some(json!(1)));
        assert!(namespace.dirty.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn open_returns_cached_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let config = BotConfig {
            data_dir: dir.path().to_path_buf(),
            ..BotConfig::default()
        };
        let (bot, _rx) = Bot::new(&config);
        let init = ModuleInit {
            bot,
            name: "storage".to_string(),
            config: toml::Value::Table(toml::value::Table::new()),
        };

        let storage = Storage::new(&init).unwrap();
        let first = storage.open("seen").unwrap();
        let second = storage.open("seen").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        storage.disable().await.unwrap();
    }
}
