//! Bounded most-recently-used list of visited subjects, persisted in a key-value store.
//!
//! Entries are unique by subject id, the most recent visit comes first and the
//! list never grows beyond its capacity.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use crate::foundation::error::{AvatarError, AvatarResult};

/// Storage key holding the JSON-encoded list.
pub const RECENT_USERS_KEY: &str = "recentUsers";
pub const DEFAULT_RECENT_CAPACITY: usize = 3;

/// String key-value storage that survives across runs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> AvatarResult<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> AvatarResult<()>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AvatarResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> AvatarResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key-value store backed by one JSON object file, rewritten on every `set`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> AvatarResult<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                AvatarError::storage(format!("parse store '{}': {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AvatarError::storage(format!(
                    "read store '{}': {e}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> AvatarResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AvatarError::storage(format!("create store dir '{}': {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json).map_err(|e| {
            AvatarError::storage(format!("write store '{}': {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> AvatarResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> AvatarResult<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

/// Encoded as a `[id, name]` pair.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct RecentSubjectEntry {
    pub subject_id: String,
    pub display_name: String,
}

impl RecentSubjectEntry {
    pub fn new(subject_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<(String, String)> for RecentSubjectEntry {
    fn from((subject_id, display_name): (String, String)) -> Self {
        Self {
            subject_id,
            display_name,
        }
    }
}

impl From<RecentSubjectEntry> for (String, String) {
    fn from(e: RecentSubjectEntry) -> Self {
        (e.subject_id, e.display_name)
    }
}

#[derive(Debug)]
pub struct RecentSubjects<S> {
    store: S,
    capacity: usize,
}

impl<S: KeyValueStore> RecentSubjects<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            capacity: DEFAULT_RECENT_CAPACITY,
        }
    }

    pub fn with_capacity(store: S, capacity: usize) -> AvatarResult<Self> {
        if capacity == 0 {
            return Err(AvatarError::validation("recent capacity must be > 0"));
        }
        Ok(Self { store, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Most recent first, unique by id, at most `capacity` entries.
    ///
    /// Unreadable stored state is logged and treated as an empty list. Repeated ids in
    /// stored state keep their first (most recent) entry.
    pub fn list_recent(&self) -> AvatarResult<Vec<RecentSubjectEntry>> {
        let Some(json) = self.store.get(RECENT_USERS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<RecentSubjectEntry>>(&json) {
            Ok(entries) => {
                let mut seen = HashSet::new();
                let mut entries: Vec<_> = entries
                    .into_iter()
                    .filter(|e| seen.insert(e.subject_id.clone()))
                    .collect();
                entries.truncate(self.capacity);
                Ok(entries)
            }
            Err(err) => {
                tracing::warn!(%err, "discarding corrupt recent-subjects state");
                Ok(Vec::new())
            }
        }
    }

    /// Move `subject_id` to the front, dropping any older entry for it and the oldest overflow.
    pub fn record_visit(
        &mut self,
        subject_id: &str,
        display_name: &str,
    ) -> AvatarResult<Vec<RecentSubjectEntry>> {
        let mut entries = self.list_recent()?;
        entries.retain(|e| e.subject_id != subject_id);
        entries.insert(0, RecentSubjectEntry::new(subject_id, display_name));
        entries.truncate(self.capacity);

        let json = serde_json::to_string(&entries)?;
        self.store.set(RECENT_USERS_KEY, json)?;
        tracing::debug!(subject_id, len = entries.len(), "recent subjects updated");
        Ok(entries)
    }
}
