//! Host storage for notedeck.
//!
//! Storage is a set of string-keyed slots, each holding one serialized
//! document. [`FileSlots`] keeps every slot as `<key>.json` in a directory
//! and replaces it atomically on write; [`MemorySlots`] is the in-process
//! equivalent. [`Store`] is a typed view over one slot holding a sequence
//! of records.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{DeckError, Result};

/// Slot holding the serialized todo/notes sequence.
pub const TODOS_SLOT: &str = "todos";
/// Slot holding the serialized blog post sequence.
pub const POSTS_SLOT: &str = "blogPosts";
/// Slot holding the single in-progress blog draft.
pub const DRAFT_SLOT: &str = "blogDraft";

/// String-keyed persistence provided by the host.
///
/// Reads and writes are synchronous and whole-slot: a write either replaces
/// the previous text completely or fails.
pub trait SlotBackend: Send + Sync {
    /// Returns the text stored under `key`, or `None` if the slot is empty.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the slot `key` with `value`.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the slot `key`. Removing an absent slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists the keys of every occupied slot, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Slots stored as JSON files in a single directory.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Opens (and creates if needed) the slot directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            debug!("Storage directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create storage directory: {}", e);
                DeckError::DirectoryError { path: dir.clone() }
            })?;
        }
        info!("Opened slot storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SlotBackend for FileSlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            trace!("Slot {} is empty", key);
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read slot file {}: {}", path.display(), e);
            DeckError::Io(e)
        })?;
        Ok(Some(text))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key);
        debug!("Writing slot {} ({} bytes)", key, value.len());

        // Write to a sibling temp file, then rename over the slot
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            DeckError::Io(e)
        })?;

        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            DeckError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            DeckError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist slot file {}: {}", path.display(), e.error);
            DeckError::Io(e.error)
        })?;

        trace!("Slot {} written", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                error!("Failed to remove slot file {}: {}", path.display(), e);
                DeckError::Io(e)
            })?;
            debug!("Removed slot {}", key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Slots held in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySlots {
    slots: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.slots.lock().map_err(|_| DeckError::ApplicationError {
            message: "Failed to acquire lock on memory slots".to_string(),
        })
    }
}

impl SlotBackend for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Memory slots whose writes can be switched to fail, like a full disk.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct FaultySlots {
    pub inner: MemorySlots,
    failing: Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl FaultySlots {
    pub fn fail_writes(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DeckError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
impl SlotBackend for FaultySlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}

/// A typed sequence of records persisted in one slot.
pub struct Store<T> {
    backend: Arc<dyn SlotBackend>,
    key: String,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            key: self.key.clone(),
            _records: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Store<T> {
    pub fn new(backend: Arc<dyn SlotBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            _records: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the sequence, defaulting to empty when the slot is absent.
    ///
    /// Text that does not parse is moved to a `<key>.corrupt-<ts>` slot
    /// before the empty sequence is returned, so nothing is lost silently.
    pub fn load(&self) -> Result<Vec<T>> {
        let Some(text) = self.backend.read(&self.key)? else {
            debug!("Slot {} absent, starting with an empty collection", self.key);
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<T>>(&text) {
            Ok(records) => {
                debug!("Loaded {} records from slot {}", records.len(), self.key);
                Ok(records)
            }
            Err(e) => {
                let quarantine = format!("{}.corrupt-{}", self.key, Utc::now().timestamp());
                warn!(
                    "Slot {} holds malformed data ({}); preserving it as {} and starting empty",
                    self.key, e, quarantine
                );
                self.backend.write(&quarantine, &text)?;
                self.backend.remove(&self.key)?;
                Ok(Vec::new())
            }
        }
    }

    /// Serializes the whole sequence and overwrites the slot.
    pub fn save(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records).map_err(|e| {
            error!("Failed to serialize slot {}: {}", self.key, e);
            DeckError::Serialization(e)
        })?;
        self.backend.write(&self.key, &json)?;
        debug!("Saved {} records to slot {}", records.len(), self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_slots_round_trip_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::open(dir.path().join("slots")).unwrap();

        assert_eq!(slots.read("todos").unwrap(), None);
        slots.write("todos", "[]").unwrap();
        slots.write("blogDraft", "{}").unwrap();
        assert_eq!(slots.read("todos").unwrap().as_deref(), Some("[]"));
        assert_eq!(slots.keys().unwrap(), vec!["blogDraft", "todos"]);

        slots.remove("todos").unwrap();
        slots.remove("todos").unwrap();
        assert_eq!(slots.keys().unwrap(), vec!["blogDraft"]);
    }

    #[test]
    fn store_defaults_to_empty() {
        let store: Store<u32> = Store::new(Arc::new(MemorySlots::new()), "nums");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn store_overwrites_whole_sequence() {
        let backend = Arc::new(MemorySlots::new());
        let store: Store<u32> = Store::new(backend.clone(), "nums");

        store.save(&[1, 2, 3]).unwrap();
        store.save(&[4]).unwrap();
        assert_eq!(store.load().unwrap(), vec![4]);
        assert_eq!(backend.read("nums").unwrap().as_deref(), Some("[4]"));
    }

    #[test]
    fn malformed_slot_is_quarantined() {
        let backend = Arc::new(MemorySlots::new());
        backend.write("nums", "{{{ definitely not json").unwrap();
        let store: Store<u32> = Store::new(backend.clone(), "nums");

        assert!(store.load().unwrap().is_empty());

        let keys = backend.keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("nums.corrupt-"));
        assert_eq!(
            backend.read(&keys[0]).unwrap().as_deref(),
            Some("{{{ definitely not json")
        );
    }
}
