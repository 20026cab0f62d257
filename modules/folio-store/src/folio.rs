//! A single file-backed folio.
//!
//! Every mutation happens under the folio's write lock and is written to disk
//! before the in-memory sequence changes:
//!
//! - `append` adds one row to the end of the file. If the write fails the file
//!   is truncated back to its previous length.
//! - `toggle_done` and `edit` rewrite the whole file through a temporary file
//!   in the same directory that is renamed over the original, so a crash
//!   leaves either the old or the new content on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::codec;
use crate::error::{FolioError, Result};
use crate::note::{self, Note};
use crate::FOLIO_EXTENSION;

#[derive(Debug)]
pub struct Folio {
    name: String,
    path: PathBuf,
    state: RwLock<FolioState>,
}

#[derive(Debug)]
struct FolioState {
    notes: Vec<Note>,
    deleted: bool,
}

impl FolioState {
    fn ensure_live(&self, name: &str) -> Result<()> {
        if self.deleted {
            return Err(FolioError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

impl Folio {
    fn with_notes(name: String, path: PathBuf, notes: Vec<Note>) -> Self {
        Self {
            name,
            path,
            state: RwLock::new(FolioState {
                notes,
                deleted: false,
            }),
        }
    }

    /// Backing file of the folio `name` inside `dir`.
    pub fn path_for(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, FOLIO_EXTENSION))
    }

    /// Creates an empty folio. Fails with `AlreadyExists` if the backing file
    /// is already there, leaving it untouched.
    ///
    /// The name is not validated here; callers accepting user input check it
    /// first.
    pub fn create(dir: &Path, name: &str) -> Result<Self> {
        let path = Self::path_for(dir, name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(FolioError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        log::info!("Created folio '{}' at {}", name, path.display());
        Ok(Self::with_notes(name.to_string(), path, Vec::new()))
    }

    /// Loads a folio from its backing file. The name is the file name without
    /// its extension.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                FolioError::Validation(format!("no folio name in {}", path.display()))
            })?
            .to_string();

        let file = File::open(path)?;
        let notes = codec::decode_all(BufReader::new(file), path)?;
        log::debug!("Loaded folio '{}' with {} notes", name, notes.len());
        Ok(Self::with_notes(name, path.to_path_buf(), notes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the notes in index order, taken under the read lock.
    pub fn notes(&self) -> Vec<Note> {
        self.state.read().notes.clone()
    }

    pub fn note(&self, index: usize) -> Option<Note> {
        self.state.read().notes.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_deleted(&self) -> bool {
        self.state.read().deleted
    }

    /// Appends a new note and returns it.
    pub fn append(&self, text: impl Into<String>) -> Result<Note> {
        let mut state = self.state.write();
        state.ensure_live(&self.name)?;

        let note = Note::new(state.notes.len(), text, note::now());
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let len_before = file.metadata()?.len();

        // A hand-edited file may lack the final line break.
        let mut row = Vec::new();
        if len_before > 0 && !ends_with_newline(&mut file)? {
            row.push(b'\n');
        }
        row.extend(codec::encode_row(&note)?);

        if let Err(e) = file.write_all(&row).and_then(|_| file.sync_data()) {
            if let Err(truncate_err) = file.set_len(len_before) {
                log::warn!(
                    "Folio '{}': failed to roll back partial append: {}",
                    self.name,
                    truncate_err
                );
            }
            return Err(e.into());
        }

        log::debug!("Folio '{}': appended note {}", self.name, note.index());
        state.notes.push(note.clone());
        Ok(note)
    }

    /// Flips the done flag of the note at `index` and returns the updated note.
    pub fn toggle_done(&self, index: usize) -> Result<Note> {
        self.rewrite_note(index, |note| note.toggle_done())
    }

    /// Replaces the text of the note at `index` and returns the updated note.
    pub fn edit(&self, index: usize, text: impl Into<String>) -> Result<Note> {
        let text = text.into();
        self.rewrite_note(index, move |note| note.edit(text))
    }

    /// Removes the backing file. The in-memory notes stay readable, but every
    /// later mutation fails with `NotFound`. Unregistering the folio is the
    /// store's job.
    pub fn delete(&self) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_live(&self.name)?;
        fs::remove_file(&self.path)?;
        state.deleted = true;
        log::info!("Deleted folio '{}'", self.name);
        Ok(())
    }

    fn rewrite_note(&self, index: usize, apply: impl FnOnce(&mut Note)) -> Result<Note> {
        let mut state = self.state.write();
        state.ensure_live(&self.name)?;

        let len = state.notes.len();
        if index >= len {
            return Err(FolioError::OutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len,
            });
        }

        let mut updated = state.notes[index].clone();
        apply(&mut updated);

        // Readers are blocked by the write lock, so the swap is never observed
        // unless the rewrite succeeds.
        let previous = std::mem::replace(&mut state.notes[index], updated);
        if let Err(e) = self.persist_all(&state.notes) {
            state.notes[index] = previous;
            return Err(e);
        }

        log::debug!("Folio '{}': rewrote note {}", self.name, index);
        Ok(state.notes[index].clone())
    }

    fn persist_all(&self, notes: &[Note]) -> Result<()> {
        let bytes = codec::encode_all(notes)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", self.name))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| FolioError::Io(e.error))?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn row_count(path: &Path) -> usize {
        let file = File::open(path).unwrap();
        codec::decode_all(file, path).unwrap().len()
    }

    #[test]
    fn test_create_starts_empty_file() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "groceries").unwrap();
        assert_eq!(folio.name(), "groceries");
        assert!(folio.is_empty());
        assert_eq!(folio.path(), dir.path().join("groceries.csv"));
        assert_eq!(fs::read(folio.path()).unwrap(), b"");
    }

    #[test]
    fn test_create_existing_file_fails_and_keeps_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("todo.csv");
        fs::write(&path, "keep me,false,1,1,1\n").unwrap();

        let err = Folio::create(dir.path(), "todo").unwrap_err();
        assert!(matches!(err, FolioError::AlreadyExists(ref name) if name == "todo"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me,false,1,1,1\n");
    }

    #[test]
    fn test_append_assigns_positions() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "log").unwrap();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let note = folio.append(*text).unwrap();
            assert_eq!(note.index(), i);
            assert!(!note.done());
            assert_eq!(note.date_created(), note.date_edited());
        }
        let notes = folio.notes();
        for (pos, note) in notes.iter().enumerate() {
            assert_eq!(note.index(), pos);
        }
        assert_eq!(row_count(folio.path()), 3);
    }

    #[test]
    fn test_reload_reproduces_memory() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "journal").unwrap();
        folio.append("first, with a comma").unwrap();
        folio.append("second \"quoted\"").unwrap();
        folio.append("third\nmultiline").unwrap();
        folio.toggle_done(1).unwrap();

        let reloaded = Folio::open(folio.path()).unwrap();
        assert_eq!(reloaded.name(), "journal");
        assert_eq!(reloaded.notes(), folio.notes());
    }

    #[test]
    fn test_toggle_twice_restores_done_and_keeps_date_done() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "chores").unwrap();
        folio.append("dishes").unwrap();

        let first = folio.toggle_done(0).unwrap();
        assert!(first.done());
        let second = folio.toggle_done(0).unwrap();
        assert!(!second.done());
        assert_eq!(second.date_done(), first.date_done());

        let reloaded = Folio::open(folio.path()).unwrap();
        assert_eq!(reloaded.notes()[0].date_done(), first.date_done());
        assert!(!reloaded.notes()[0].done());
    }

    #[test]
    fn test_out_of_range_leaves_everything_unchanged() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "inbox").unwrap();
        folio.append("a").unwrap();
        folio.append("b").unwrap();

        let before_notes = folio.notes();
        let before_bytes = fs::read(folio.path()).unwrap();

        for index in [2, 3, usize::MAX] {
            assert!(matches!(
                folio.toggle_done(index),
                Err(FolioError::OutOfRange { len: 2, .. })
            ));
            assert!(matches!(
                folio.edit(index, "nope"),
                Err(FolioError::OutOfRange { len: 2, .. })
            ));
        }

        assert_eq!(folio.notes(), before_notes);
        assert_eq!(fs::read(folio.path()).unwrap(), before_bytes);
    }

    #[test]
    fn test_edit_replaces_text_and_keeps_index() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "ideas").unwrap();
        folio.append("rough").unwrap();
        folio.append("other").unwrap();

        let edited = folio.edit(0, "polished").unwrap();
        assert_eq!(edited.index(), 0);
        assert_eq!(edited.text(), "polished");
        assert!(edited.date_edited() >= edited.date_created());

        let reloaded = Folio::open(folio.path()).unwrap();
        assert_eq!(reloaded.notes()[0].text(), "polished");
        assert_eq!(reloaded.notes()[1].text(), "other");
        assert_eq!(reloaded.notes()[1].index(), 1);
    }

    #[test]
    fn test_append_append_toggle_scenario() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "abc").unwrap();
        folio.append("a").unwrap();
        folio.append("b").unwrap();
        folio.toggle_done(0).unwrap();

        let check = |notes: Vec<Note>| {
            assert_eq!(notes.len(), 2);
            assert_eq!((notes[0].text(), notes[0].done(), notes[0].index()), ("a", true, 0));
            assert_eq!((notes[1].text(), notes[1].done(), notes[1].index()), ("b", false, 1));
        };
        check(folio.notes());
        check(Folio::open(folio.path()).unwrap().notes());
    }

    #[test]
    fn test_rewrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "tidy").unwrap();
        folio.append("x").unwrap();
        folio.toggle_done(0).unwrap();
        folio.edit(0, "y").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["tidy.csv".to_string()]);
    }

    #[test]
    fn test_failed_append_does_not_advance_memory() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "vanishing").unwrap();
        folio.append("kept").unwrap();

        fs::remove_file(folio.path()).unwrap();
        assert!(matches!(folio.append("lost"), Err(FolioError::Io(_))));
        assert_eq!(folio.len(), 1);
    }

    #[test]
    fn test_append_after_missing_final_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("handmade.csv");
        fs::write(&path, "a,false,1,1,1").unwrap();

        let folio = Folio::open(&path).unwrap();
        let note = folio.append("b").unwrap();
        assert_eq!(note.index(), 1);

        let reloaded = Folio::open(&path).unwrap();
        assert_eq!(reloaded.notes(), folio.notes());
        assert_eq!(reloaded.notes()[0].text(), "a");
        assert_eq!(reloaded.notes()[1].text(), "b");
    }

    #[test]
    fn test_failed_rewrite_restores_memory() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "stranded").unwrap();
        folio.append("first").unwrap();
        folio.append("second").unwrap();
        let before = folio.notes();

        fs::remove_dir_all(dir.path()).unwrap();
        assert!(matches!(folio.toggle_done(0), Err(FolioError::Io(_))));
        assert_eq!(folio.notes(), before);
        assert!(matches!(folio.edit(1, "changed"), Err(FolioError::Io(_))));
        assert_eq!(folio.notes(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "shared").unwrap();
        folio.append("x").unwrap();
        fs::set_permissions(folio.path(), fs::Permissions::from_mode(0o644)).unwrap();

        folio.toggle_done(0).unwrap();
        folio.edit(0, "y").unwrap();
        let mode = fs::metadata(folio.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_delete_removes_file_and_blocks_mutation() {
        let dir = tempdir().unwrap();
        let folio = Folio::create(dir.path(), "gone").unwrap();
        folio.append("last words").unwrap();

        folio.delete().unwrap();
        assert!(!folio.path().exists());
        assert!(folio.is_deleted());
        assert_eq!(folio.len(), 1);

        assert!(matches!(folio.append("again"), Err(FolioError::NotFound(_))));
        assert!(matches!(folio.toggle_done(0), Err(FolioError::NotFound(_))));
        assert!(matches!(folio.delete(), Err(FolioError::NotFound(_))));
        assert!(!folio.path().exists());
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "ok,false,1,1,1\nbad,false,1,1\n").unwrap();
        assert!(matches!(
            Folio::open(&path),
            Err(FolioError::Parse { row: 2, .. })
        ));
    }

    #[test]
    fn test_concurrent_appends() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let dir = tempdir().unwrap();
        let folio = Arc::new(Folio::create(dir.path(), "busy").unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let folio = Arc::clone(&folio);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| folio.append(format!("t{}-{}", t, i)).unwrap().index())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut indexes: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        indexes.sort_unstable();
        assert_eq!(indexes, (0..THREADS * PER_THREAD).collect::<Vec<_>>());

        let memory = folio.notes();
        assert_eq!(memory.len(), THREADS * PER_THREAD);
        let on_disk = Folio::open(folio.path()).unwrap().notes();
        assert_eq!(on_disk, memory);

        // Each thread's notes appear in the order that thread wrote them.
        for t in 0..THREADS {
            let prefix = format!("t{}-", t);
            let seq: Vec<usize> = on_disk
                .iter()
                .filter_map(|n| n.text().strip_prefix(&prefix))
                .map(|s| s.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..PER_THREAD).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_readers_see_consistent_snapshots_during_writes() {
        let dir = tempdir().unwrap();
        let folio = Arc::new(Folio::create(dir.path(), "watched").unwrap());

        let writer = {
            let folio = Arc::clone(&folio);
            thread::spawn(move || {
                for i in 0..50 {
                    folio.append(format!("n{}", i)).unwrap();
                    if i % 5 == 0 {
                        folio.toggle_done(i).unwrap();
                    }
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let folio = Arc::clone(&folio);
                thread::spawn(move || {
                    for _ in 0..200 {
                        for (pos, note) in folio.notes().iter().enumerate() {
                            assert_eq!(note.index(), pos);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(folio.len(), 50);
    }
}
