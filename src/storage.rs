use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StorageError;

/// Session-scoped breadcrumb trail.
pub const BREADCRUMBS_KEY: &str = "breadcrumbs";
/// Session-scoped quick contacts placeholders.
pub const QUICK_CONTACTS_KEY: &str = "quick_contacts_list";
/// Session-scoped site configuration cache.
pub const CONFIG_KEY: &str = "config";
/// Durable language preference (`ita` | `eng`).
pub const LANGUAGE_KEY: &str = "language";

/// String key-value storage. Values are opaque text, usually JSON.
///
/// `set` and `remove` never fail the caller; implementations backed by
/// something fallible log and carry on.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process store, gone when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

/// Store persisted as a flat TOML table of strings. Every write rewrites the file.
pub struct FileStore {
    path: PathBuf,
    table: Mutex<toml::Table>,
}

impl FileStore {
    /// Opens (or lazily creates) the table at `path`. A file that does not
    /// parse is treated as empty and overwritten by the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(content) => content.parse::<toml::Table>().unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "storage file unreadable, starting empty");
                toml::Table::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(source) => {
                return Err(StorageError::Io { path: path.display().to_string(), source });
            }
        };
        Ok(Self { path, table: Mutex::new(table) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, table: &toml::Table) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "could not create storage directory");
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, table.to_string()) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write storage file");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.insert(key.to_string(), toml::Value::String(value.to_string()));
        self.flush(&table);
    }

    fn remove(&self, key: &str) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table.remove(key).is_some() {
            self.flush(&table);
        }
    }
}

/// The two storage scopes the application works with.
#[derive(Clone)]
pub struct Storage {
    /// Survives restarts.
    pub local: Arc<dyn KeyValueStore>,
    /// Survives "reloads" within one browsing session.
    pub session: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { local, session }
    }

    /// Both scopes in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Durable scope under `dir/local.toml`; session scope in `dir/sessions/<name>.toml`
    /// when a session name is given, otherwise in memory.
    pub fn open(dir: &Path, session: Option<&str>) -> Result<Self, StorageError> {
        if let Some(name) = session {
            validate_session_name(name)?;
        }
        let local: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.join("local.toml"))?);
        let session: Arc<dyn KeyValueStore> = match session {
            Some(name) => {
                let path = dir.join("sessions").join(format!("{name}.toml"));
                Arc::new(FileStore::open(path)?)
            }
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self { local, session })
    }
}

/// Session names become file names, so they must stay a single plain path component.
fn validate_session_name(name: &str) -> Result<(), StorageError> {
    let plain = !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute();
    if plain { Ok(()) } else { Err(StorageError::InvalidSession(name.to_string())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_last_write_wins() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "one");
        store.set("k", "two");
        assert_eq!(store.get("k").as_deref(), Some("two"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
        store.remove("k");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.toml");
        {
            let store = FileStore::open(&path).unwrap();
            store.set(LANGUAGE_KEY, "eng");
            store.set(BREADCRUMBS_KEY, r#"[{"lvl":0}]"#);
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("eng"));
        assert_eq!(store.get(BREADCRUMBS_KEY).as_deref(), Some(r#"[{"lvl":0}]"#));
        store.remove(LANGUAGE_KEY);
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(LANGUAGE_KEY), None);
    }

    #[test]
    fn garbage_table_opens_empty_and_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.toml");
        fs::write(&path, "language = = broken").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(LANGUAGE_KEY), None);

        store.set(LANGUAGE_KEY, "eng");
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(LANGUAGE_KEY).as_deref(), Some("eng"));
    }

    #[test]
    fn storage_opens_over_garbage_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("local.toml"), "language = = broken").unwrap();
        fs::create_dir_all(dir.path().join("sessions")).unwrap();
        fs::write(dir.path().join("sessions").join("tab1.toml"), "[[[").unwrap();
        let storage = Storage::open(dir.path(), Some("tab1")).unwrap();
        assert_eq!(storage.local.get(LANGUAGE_KEY), None);
        assert_eq!(storage.session.get(BREADCRUMBS_KEY), None);
    }

    #[test]
    fn session_names_cannot_leave_the_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../../x", "a/b", "a\\b", "..", "", "/tmp/x"] {
            assert!(
                matches!(Storage::open(dir.path(), Some(name)), Err(StorageError::InvalidSession(_))),
                "{name:?} accepted"
            );
        }
        assert!(Storage::open(dir.path(), Some("tab-1.work")).is_ok());
        assert!(!dir.path().join("local.toml").exists());
    }

    #[test]
    fn named_session_is_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        Storage::open(dir.path(), Some("tab1")).unwrap().session.set("x", "1");
        let reopened = Storage::open(dir.path(), Some("tab1")).unwrap();
        assert_eq!(reopened.session.get("x").as_deref(), Some("1"));
        let anonymous = Storage::open(dir.path(), None).unwrap();
        assert_eq!(anonymous.session.get("x"), None);
    }
}
