//! Persistence adapter
//!
//! Playback positions and bookmark lists are stored as strings in a
//! key-value backend (browser `localStorage`, a JSON file, or memory).
//! Keys come from [`StorageKey`], never from ad-hoc formatting, so two
//! records can never share a key.
//!
//! Reads are lenient: a record that fails to parse is reported with a
//! warning and treated as "no saved data". Writes are fire-and-forget: a
//! failed write is logged and the in-memory state stays authoritative.

use crate::types::VideoId;
use crate::Result;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// String key-value backend
pub trait KeyValueStore {
    fn get(&self, key: &StorageKey) -> Result<Option<String>>;
    fn set(&mut self, key: &StorageKey, value: &str) -> Result<()>;
}

/// Per-video record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    History,
    Bookmarks,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::History => "history",
            RecordKind::Bookmarks => "bookmarks",
        }
    }
}

/// Application-wide records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppKey {
    Theme,
}

/// A persistence key.
///
/// Per-video keys have the shape `{namespace}-{id}-{kind}`. The namespace
/// holds no `-` and every kind ends differently, so the mapping from
/// `(kind, id)` to key is injective. App keys carry no namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn video(namespace: &str, kind: RecordKind, id: &VideoId) -> Self {
        Self(format!("{}-{}-{}", namespace, id, kind.as_str()))
    }

    pub fn app(key: AppKey) -> Self {
        match key {
            AppKey::Theme => Self("theme".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw read by key string
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Raw write by key string, bypassing the key builder
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key.as_str()).cloned())
    }

    fn set(&mut self, key: &StorageKey, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.as_str().to_string(), value.to_string());
        Ok(())
    }
}

/// Backend persisted as a flat JSON object in a single file.
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) if json.trim().is_empty() => BTreeMap::new(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened file store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        Ok(self.entries.get(key.as_str()).cloned())
    }

    fn set(&mut self, key: &StorageKey, value: &str) -> Result<()> {
        self.entries
            .insert(key.as_str().to_string(), value.to_string());
        self.flush()
    }
}

/// Typed access to the per-video and app records
pub struct Persistence {
    backend: Box<dyn KeyValueStore>,
    namespace: String,
}

impl Persistence {
    pub fn new(backend: Box<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, kind: RecordKind, id: &VideoId) -> StorageKey {
        StorageKey::video(&self.namespace, kind, id)
    }

    /// Last saved playback position for `id`
    pub fn load_history(&self, id: &VideoId) -> Option<f64> {
        let key = self.key(RecordKind::History, id);
        let raw = self.read(&key)?;
        match parse_history(&raw) {
            Some(position) => Some(position),
            None => {
                warn!(key = %key, value = %raw, "Ignoring malformed playback history");
                None
            }
        }
    }

    pub fn save_history(&mut self, id: &VideoId, position: f64) {
        let key = self.key(RecordKind::History, id);
        self.write(&key, &position.to_string());
    }

    /// Saved bookmarks for `id`, in creation order
    pub fn load_bookmarks(&self, id: &VideoId) -> Vec<f64> {
        let key = self.key(RecordKind::Bookmarks, id);
        let Some(raw) = self.read(&key) else {
            return Vec::new();
        };
        match parse_bookmarks(&raw, id) {
            Some(bookmarks) => bookmarks,
            None => {
                warn!(key = %key, "Ignoring malformed bookmark list");
                Vec::new()
            }
        }
    }

    pub fn save_bookmarks(&mut self, id: &VideoId, bookmarks: &[f64]) {
        let key = self.key(RecordKind::Bookmarks, id);
        match serde_json::to_string(bookmarks) {
            Ok(json) => self.write(&key, &json),
            Err(e) => warn!(key = %key, error = %e, "Failed to encode bookmarks"),
        }
    }

    pub fn load_app(&self, key: AppKey) -> Option<String> {
        self.read(&StorageKey::app(key))
    }

    pub fn save_app(&mut self, key: AppKey, value: &str) {
        self.write(&StorageKey::app(key), value);
    }

    fn read(&self, key: &StorageKey) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Persistence read failed");
                None
            }
        }
    }

    fn write(&mut self, key: &StorageKey, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!(key = %key, error = %e, "Persistence write failed");
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

fn parse_history(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
}

/// Accepts a JSON array of seconds, or the legacy layout where the whole
/// id → list map was written under every video's key.
fn parse_bookmarks(raw: &str, id: &VideoId) -> Option<Vec<f64>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let list = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get(id.as_str()) {
            Some(serde_json::Value::Array(items)) => items,
            Some(_) => return None,
            None => return Some(Vec::new()),
        },
        _ => return None,
    };
    Some(
        list.iter()
            .filter_map(serde_json::Value::as_f64)
            .filter(|t| t.is_finite() && *t >= 0.0)
            .collect(),
    )
}
