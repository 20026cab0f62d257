//! CSV encoding of notes.
//!
//! Each note is one row of exactly five fields: `text`, `done`,
//! `date_created`, `date_done`, `date_edited`. There is no header row and the
//! note's index is not stored; it is the row's position in the file.

use std::io::{self, Read};
use std::path::Path;

use crate::error::{FolioError, Result};
use crate::note::Note;

const FIELD_COUNT: usize = 5;

fn writer(buf: Vec<u8>) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf)
}

fn record(note: &Note) -> [String; FIELD_COUNT] {
    [
        note.text().to_string(),
        note.done().to_string(),
        note.date_created().to_string(),
        note.date_done().to_string(),
        note.date_edited().to_string(),
    ]
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| FolioError::Io(io::Error::other(e.to_string())))
}

/// Encodes a single note as one terminated CSV row.
pub fn encode_row(note: &Note) -> Result<Vec<u8>> {
    let mut wtr = writer(Vec::new());
    wtr.write_record(record(note)).map_err(io::Error::from)?;
    finish(wtr)
}

/// Encodes a whole folio, one row per note in sequence order.
pub fn encode_all(notes: &[Note]) -> Result<Vec<u8>> {
    let mut wtr = writer(Vec::with_capacity(notes.len() * 48));
    for note in notes {
        wtr.write_record(record(note)).map_err(io::Error::from)?;
    }
    finish(wtr)
}

/// Decodes every row of a folio file. `path` is only used for error reports.
///
/// Any malformed row fails the whole decode.
pub fn decode_all<R: Read>(reader: R, path: &Path) -> Result<Vec<Note>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut notes = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let row = index + 1;
        let parse_err = |reason: String| FolioError::Parse {
            path: path.to_path_buf(),
            row,
            reason,
        };

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(FolioError::Io(io::Error::from(e))),
            Err(e) => return Err(parse_err(e.to_string())),
        };

        if record.len() != FIELD_COUNT {
            return Err(parse_err(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                record.len()
            )));
        }

        let done = parse_bool(&record[1])
            .ok_or_else(|| parse_err(format!("invalid done flag {:?}", &record[1])))?;
        let date_created = parse_timestamp(&record[2], "date_created").map_err(parse_err)?;
        let date_done = parse_timestamp(&record[3], "date_done").map_err(parse_err)?;
        let date_edited = parse_timestamp(&record[4], "date_edited").map_err(parse_err)?;

        notes.push(Note::from_parts(
            index,
            record[0].to_string(),
            done,
            date_created,
            date_done,
            date_edited,
        ));
    }

    Ok(notes)
}

/// Accepts the spellings older folio files were written with, not just
/// `true`/`false`.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "TRUE" | "True" | "t" | "T" | "1" => Some(true),
        "false" | "FALSE" | "False" | "f" | "F" | "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(s: &str, field: &str) -> std::result::Result<i64, String> {
    s.parse::<i64>()
        .map_err(|e| format!("invalid {} {:?}: {}", field, s, e))
}
