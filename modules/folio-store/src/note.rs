//! A single entry in a folio.

use chrono::Utc;

/// Current time as seconds since the Unix epoch.
pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

/// One append-only entry of a folio.
///
/// `index` is the note's position in its folio. It is fixed when the note is
/// appended and never reassigned, since notes are never removed or reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    index: usize,
    text: String,
    done: bool,
    date_created: i64,
    date_done: i64,
    date_edited: i64,
}

impl Note {
    /// A fresh, not-done note with all timestamps set to `at`.
    pub(crate) fn new(index: usize, text: impl Into<String>, at: i64) -> Self {
        Self {
            index,
            text: text.into(),
            done: false,
            date_created: at,
            date_done: at,
            date_edited: at,
        }
    }

    /// Rebuilds a persisted note. Used by the codec.
    pub(crate) fn from_parts(
        index: usize,
        text: String,
        done: bool,
        date_created: i64,
        date_done: i64,
        date_edited: i64,
    ) -> Self {
        Self {
            index,
            text,
            done,
            date_created,
            date_done,
            date_edited,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn date_created(&self) -> i64 {
        self.date_created
    }

    /// Time the note was last marked done. Only meaningful while `done()` is true.
    pub fn date_done(&self) -> i64 {
        self.date_done
    }

    pub fn date_edited(&self) -> i64 {
        self.date_edited
    }

    /// Replaces the text and stamps `date_edited`.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.date_edited = now().max(self.date_created);
    }

    /// Flips `done`. Marking done stamps `date_done`; un-marking keeps the
    /// previous completion time.
    pub fn toggle_done(&mut self) {
        self.done = !self.done;
        if self.done {
            self.date_done = now();
        }
    }

    /// One-line rendering for listings: `"<n>. <text>"` with a 1-based `n`,
    /// suffixed with a check mark once done.
    pub fn display_line(&self) -> String {
        if self.done {
            format!("{}. {} ✅", self.index + 1, self.text)
        } else {
            format!("{}. {}", self.index + 1, self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_is_open() {
        let note = Note::new(3, "buy milk", 1_700_000_000);
        assert_eq!(note.index(), 3);
        assert_eq!(note.text(), "buy milk");
        assert!(!note.done());
        assert_eq!(note.date_created(), 1_700_000_000);
        assert_eq!(note.date_done(), 1_700_000_000);
        assert_eq!(note.date_edited(), 1_700_000_000);
    }

    #[test]
    fn test_toggle_done_keeps_completion_time_when_reopened() {
        let mut note = Note::new(0, "a", 100);
        note.toggle_done();
        assert!(note.done());
        let completed_at = note.date_done();
        assert!(completed_at >= 100);

        note.toggle_done();
        assert!(!note.done());
        assert_eq!(note.date_done(), completed_at);
    }

    #[test]
    fn test_edit_stamps_date_edited() {
        let mut note = Note::new(0, "draft", 100);
        note.edit("final");
        assert_eq!(note.text(), "final");
        assert!(note.date_edited() >= note.date_created());
        assert!(note.date_edited() > 100);
        assert_eq!(note.index(), 0);
    }

    #[test]
    fn test_edit_never_predates_creation() {
        let future = now() + 3600;
        let mut note = Note::new(0, "from the future", future);
        note.edit("still");
        assert_eq!(note.date_edited(), future);
    }

    #[test]
    fn test_display_line() {
        let mut note = Note::new(1, "walk dog", 0);
        assert_eq!(note.display_line(), "2. walk dog");
        note.toggle_done();
        assert_eq!(note.display_line(), "2. walk dog ✅");
    }
}
