//! Registry of the live folios in a data directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FolioError, Result};
use crate::folio::Folio;

/// Owns every folio of one data directory.
///
/// The name→folio map has its own lock, separate from each folio's lock:
/// creating or removing a folio only blocks other structural changes and
/// lookups, never reads or writes of unrelated folios.
#[derive(Debug)]
pub struct FolioStore {
    dir: PathBuf,
    folios: RwLock<HashMap<String, Arc<Folio>>>,
}

impl FolioStore {
    /// An empty store over `dir`, without reading it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            folios: RwLock::new(HashMap::new()),
        }
    }

    /// Loads every folio file in `dir`.
    ///
    /// Sub-directories and hidden files are skipped. Any file that fails to
    /// read or parse aborts the whole load.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut folios = HashMap::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let folio = Folio::open(&entry.path())?;
            let name = folio.name().to_string();
            if folios.contains_key(&name) {
                return Err(FolioError::AlreadyExists(name));
            }
            folios.insert(name, Arc::new(folio));
        }

        log::info!("Loaded {} folios from {}", folios.len(), dir.display());
        Ok(Self {
            dir,
            folios: RwLock::new(folios),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, name: &str) -> Option<Arc<Folio>> {
        self.folios.read().get(name).cloned()
    }

    /// Sorted names of all live folios.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.folios.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.folios.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.folios.read().is_empty()
    }

    /// Creates a new folio and registers it.
    ///
    /// Fails with `AlreadyExists` if the name is registered or its file is
    /// already on disk.
    pub fn create(&self, name: &str) -> Result<Arc<Folio>> {
        let mut folios = self.folios.write();
        if folios.contains_key(name) {
            return Err(FolioError::AlreadyExists(name.to_string()));
        }
        let folio = Arc::new(Folio::create(&self.dir, name)?);
        folios.insert(name.to_string(), Arc::clone(&folio));
        Ok(folio)
    }

    /// Deletes the folio's file and unregisters it.
    ///
    /// Handles to the folio held elsewhere keep their notes readable but can
    /// no longer mutate it.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut folios = self.folios.write();
        let folio = folios
            .get(name)
            .cloned()
            .ok_or_else(|| FolioError::NotFound(name.to_string()))?;
        folio.delete()?;
        folios.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_load_reads_every_folio() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("work.csv"), "ship it,false,1,1,1\n").unwrap();
        fs::write(dir.path().join("home.csv"), "").unwrap();

        let store = FolioStore::load(dir.path()).unwrap();
        assert_eq!(store.names(), vec!["home".to_string(), "work".to_string()]);
        assert_eq!(store.get("work").unwrap().notes()[0].text(), "ship it");
        assert!(store.get("home").unwrap().is_empty());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_load_fails_fast_on_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.csv"), "fine,false,1,1,1\n").unwrap();
        fs::write(dir.path().join("bad.csv"), "broken,nope,1,1,1\n").unwrap();

        let err = FolioStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, FolioError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_dir_is_io_error() {
        let dir = tempdir().unwrap();
        let err = FolioStore::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, FolioError::Io(_)));
    }

    #[test]
    fn test_load_skips_hidden_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".work.abc123.tmp"), "half written").unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("work.csv"), "").unwrap();

        let store = FolioStore::load(dir.path()).unwrap();
        assert_eq!(store.names(), vec!["work".to_string()]);
    }

    #[test]
    fn test_create_registers_and_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let store = FolioStore::new(dir.path());

        let folio = store.create("travel").unwrap();
        folio.append("passport").unwrap();
        assert_eq!(store.len(), 1);

        assert!(matches!(
            store.create("travel"),
            Err(FolioError::AlreadyExists(_))
        ));
        assert_eq!(store.get("travel").unwrap().len(), 1);
    }

    #[test]
    fn test_create_rejects_unregistered_file_on_disk() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("stray.csv"), "x,false,1,1,1\n").unwrap();
        let store = FolioStore::new(dir.path());

        assert!(matches!(
            store.create("stray"),
            Err(FolioError::AlreadyExists(_))
        ));
        assert!(store.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("stray.csv")).unwrap(),
            "x,false,1,1,1\n"
        );
    }

    #[test]
    fn test_remove_deletes_file_and_mapping() {
        let dir = tempdir().unwrap();
        let store = FolioStore::new(dir.path());
        let handle = store.create("temp").unwrap();
        handle.append("note").unwrap();

        store.remove("temp").unwrap();
        assert!(store.get("temp").is_none());
        assert!(!dir.path().join("temp.csv").exists());
        assert!(matches!(handle.append("late"), Err(FolioError::NotFound(_))));

        assert!(matches!(store.remove("temp"), Err(FolioError::NotFound(_))));
    }

    #[test]
    fn test_round_trip_through_store() {
        let dir = tempdir().unwrap();
        let store = FolioStore::new(dir.path());
        let folio = store.create("books").unwrap();
        for title in ["Dune", "Emma", "Ulysses, abridged"] {
            folio.append(title).unwrap();
        }
        folio.edit(1, "Emma (reread)").unwrap();
        let before = folio.notes();

        let reloaded = FolioStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.get("books").unwrap().notes(), before);
    }

    #[test]
    fn test_concurrent_creates_register_each_name_once() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FolioStore::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.create("shared").is_ok())
            })
            .collect();
        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(created, 1);
        assert_eq!(store.names(), vec!["shared".to_string()]);
    }
}
