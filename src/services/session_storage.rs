use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::services::Subscription;

/// Storage key holding the serialized identity.
pub const USER_KEY: &str = "user";
/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Change notification for one key. `new_value` is `None` when the key was
/// removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

/// Durable key/value storage shared by every client instance on the same
/// machine. Reads and writes are synchronous.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;

    fn remove(&self, key: &str) -> std::io::Result<()>;

    fn clear(&self) -> std::io::Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    /// Starts noticing changes made outside this process, when the backend
    /// can detect them.
    fn watch_external(&self, _interval: Duration) -> Option<Subscription> {
        None
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn diff(
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
) -> Vec<StorageEvent> {
    let mut events = Vec::new();
    for (key, value) in after {
        if before.get(key) != Some(value) {
            events.push(StorageEvent {
                key: key.clone(),
                new_value: Some(value.clone()),
            });
        }
    }
    for key in before.keys() {
        if !after.contains_key(key) {
            events.push(StorageEvent {
                key: key.clone(),
                new_value: None,
            });
        }
    }
    events
}

/// In-process storage. Clones share the same entries and event stream, so
/// two sessions built over clones behave like two windows of one client.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            events,
        }
    }

    fn publish(&self, events: Vec<StorageEvent>) {
        for event in events {
            let _ = self.events.send(event);
        }
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        self.publish(vec![StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        }]);
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        let removed = lock(&self.entries).remove(key);
        if removed.is_some() {
            self.publish(vec![StorageEvent {
                key: key.to_string(),
                new_value: None,
            }]);
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        let before = std::mem::take(&mut *lock(&self.entries));
        self.publish(diff(&before, &BTreeMap::new()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

struct FileStorageInner {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

/// Storage persisted as a JSON object in a single file.
///
/// Local writes are announced immediately. Writes by other processes are only
/// seen once [`DurableStorage::watch_external`] is running.
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<FileStorageInner>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let entries = read_entries(&path);
        let (events, _) = broadcast::channel(32);
        Ok(Self {
            inner: Arc::new(FileStorageInner {
                path,
                entries: Mutex::new(entries),
                events,
            }),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        let data = serde_json::to_vec_pretty(entries)?;
        let tmp = self.inner.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.inner.path)
    }

    fn update<F>(&self, change: F) -> std::io::Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let events = {
            let mut entries = lock(&self.inner.entries);
            let before = entries.clone();
            change(&mut *entries);
            self.persist(&*entries)?;
            diff(&before, &*entries)
        };
        for event in events {
            let _ = self.inner.events.send(event);
        }
        Ok(())
    }

    /// Re-reads the file and announces whatever changed since the last look.
    pub fn sync_from_disk(&self) -> Vec<StorageEvent> {
        let on_disk = read_entries(&self.inner.path);
        let events = {
            let mut entries = lock(&self.inner.entries);
            let events = diff(&entries, &on_disk);
            *entries = on_disk;
            events
        };
        for event in &events {
            debug!(key = %event.key, removed = event.new_value.is_none(), "external storage change");
            let _ = self.inner.events.send(event.clone());
        }
        events
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            BTreeMap::new()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            warn!("Could not read session file {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.inner.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> std::io::Result<()> {
        self.update(|entries| entries.clear())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    fn watch_external(&self, interval: Duration) -> Option<Subscription> {
        let storage = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                storage.sync_from_disk();
            }
        });
        Some(Subscription::new(handle))
    }
}
