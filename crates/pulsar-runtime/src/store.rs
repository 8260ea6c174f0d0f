use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, broadcast};

// ---------------------------------------------------------------------------
// SensorStore — the capability the orchestrator consumes
// ---------------------------------------------------------------------------

/// The external key-value store holding current sensor readings.
///
/// Values are strings on the wire; the orchestrator parses them as doubles
/// where possible. Missing keys are omitted from `get_many` results.
/// Implementations must support concurrent calls from a single process;
/// Pulsar itself serializes per-cycle reads and writes.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Current-value snapshot for `keys`; missing keys are omitted.
    async fn get_many(&self, keys: &[String]) -> anyhow::Result<HashMap<String, String>>;

    /// Atomic-per-key write; ordering across keys in one call is
    /// unspecified.
    async fn set_many(&self, entries: HashMap<String, String>) -> anyhow::Result<()>;

    /// Publish a message on a named pub-sub channel.
    async fn publish(&self, channel: &str, message: &str) -> anyhow::Result<()>;

    /// Subscribe to a named channel.
    async fn subscribe(&self, channel: &str) -> anyhow::Result<broadcast::Receiver<String>>;

    /// Per-key timestamp support. Stores without one return `None`; the
    /// orchestrator then uses its own clock.
    async fn get_with_timestamp(&self, _key: &str) -> anyhow::Result<Option<(String, i64)>> {
        Ok(None)
    }
}

/// Build a store from a connection string. `mem://` is the only built-in
/// scheme; real deployments plug their store client in behind the trait.
pub fn build_store(connection: &str) -> anyhow::Result<Arc<dyn SensorStore>> {
    match connection {
        "mem://" => Ok(Arc::new(MemoryStore::new())),
        other => anyhow::bail!(
            "unsupported store connection string {other:?} (expected mem://)"
        ),
    }
}

// ---------------------------------------------------------------------------
// MemoryStore — process-local reference implementation
// ---------------------------------------------------------------------------

/// In-process store used by tests and the `mem://` connection scheme.
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Direct write, bypassing `set_many`; handy for seeding tests.
    pub async fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Direct read of one key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    pub async fn remove(&self, key: &str) {
        self.values.write().await.remove(key);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn get_many(&self, keys: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let values = self.values.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| values.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn set_many(&self, entries: HashMap<String, String>) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        for (k, v) in entries {
            values.insert(k, v);
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> anyhow::Result<()> {
        let channels = self.channels.lock().await;
        if let Some(sender) = channels.get(channel) {
            // No subscribers is not an error; the message is simply dropped.
            let _ = sender.send(message.to_string());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> anyhow::Result<broadcast::Receiver<String>> {
        let mut channels = self.channels.lock().await;
        let sender = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(64).0);
        Ok(sender.subscribe())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
