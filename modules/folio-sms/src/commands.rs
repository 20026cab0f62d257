//! Short text commands for managing folios over SMS.

use async_trait::async_trait;
use folio_client::AppendedClient;

/// The folio operations the commands need.
#[async_trait]
pub trait FolioApi: Send + Sync {
    async fn get_folios(&self) -> Result<Vec<String>, String>;
    async fn create_folio(&self, name: &str) -> Result<(), String>;
    async fn delete_folio(&self, name: &str) -> Result<(), String>;
    async fn get_notes(&self, folio: &str) -> Result<Vec<String>, String>;
    async fn add_note(&self, folio: &str, note: &str) -> Result<(), String>;
    async fn edit_note(&self, folio: &str, index: usize, note: &str) -> Result<(), String>;
    async fn toggle_done(&self, folio: &str, index: usize) -> Result<(), String>;
}

#[async_trait]
impl FolioApi for AppendedClient {
    async fn get_folios(&self) -> Result<Vec<String>, String> {
        AppendedClient::get_folios(self).await
    }

    async fn create_folio(&self, name: &str) -> Result<(), String> {
        AppendedClient::create_folio(self, name).await
    }

    async fn delete_folio(&self, name: &str) -> Result<(), String> {
        AppendedClient::delete_folio(self, name).await
    }

    async fn get_notes(&self, folio: &str) -> Result<Vec<String>, String> {
        AppendedClient::get_notes(self, folio).await
    }

    async fn add_note(&self, folio: &str, note: &str) -> Result<(), String> {
        AppendedClient::add_note(self, folio, note).await
    }

    async fn edit_note(&self, folio: &str, index: usize, note: &str) -> Result<(), String> {
        AppendedClient::edit_note(self, folio, index, note).await
    }

    async fn toggle_done(&self, folio: &str, index: usize) -> Result<(), String> {
        AppendedClient::toggle_done(self, folio, index).await
    }
}

/// Suffix the service puts on display lines of done notes.
const DONE_SUFFIX: &str = " ✅";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// `h`
    Help,
    /// `lf`
    ListFolios,
    /// `cf <folio>`
    CreateFolio(String),
    /// `df <folio>`
    DeleteFolio(String),
    /// `ln <folio>`: open notes only
    ListNotes(String),
    /// `lna <folio>`: every note, done ones included
    ListAllNotes(String),
    /// `dn <folio> <number>`, with a 1-based note number
    ToggleDone { folio: String, number: usize },
    /// `a <folio> <text...>`
    Append { folio: String, text: String },
    /// `e <folio> <number> <text...>`
    Edit {
        folio: String,
        number: usize,
        text: String,
    },
}

/// Parses a message into a command. The error is the reply to send back.
pub fn parse(text: &str) -> Result<Command, String> {
    let text = text.trim();
    let parts: Vec<&str> = text.split_whitespace().collect();

    log::debug!("SMS commands: Parsing '{}' -> {} parts", text, parts.len());

    let Some(first) = parts.first() else {
        return Err("Empty text message received".to_string());
    };
    let command = first.to_lowercase();

    let command = match (command.as_str(), parts.len()) {
        ("h", 1) => Command::Help,
        ("lf", 1) => Command::ListFolios,
        ("cf", 2) => Command::CreateFolio(parts[1].to_string()),
        ("df", 2) => Command::DeleteFolio(parts[1].to_string()),
        ("ln", 2) => Command::ListNotes(parts[1].to_string()),
        ("lna", 2) => Command::ListAllNotes(parts[1].to_string()),
        ("dn", 3) => Command::ToggleDone {
            folio: parts[1].to_string(),
            number: parse_number(parts[2])?,
        },
        ("a", n) if n >= 3 => Command::Append {
            folio: parts[1].to_string(),
            text: rest_after(text, 2).to_string(),
        },
        ("e", n) if n >= 4 => Command::Edit {
            folio: parts[1].to_string(),
            number: parse_number(parts[2])?,
            text: rest_after(text, 3).to_string(),
        },
        _ => {
            log::debug!("SMS commands: Unknown command '{}'", text);
            return Err("Invalid command".to_string());
        }
    };
    Ok(command)
}

/// Note numbers in messages start at 1.
fn parse_number(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("Invalid note number: {}", raw)),
    }
}

/// The text after the first `words` whitespace-separated words, with its
/// inner spacing intact.
fn rest_after(text: &str, words: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..words {
        rest = match rest.find(char::is_whitespace) {
            Some(end) => rest[end..].trim_start(),
            None => "",
        };
    }
    rest
}

pub fn help() -> String {
    [
        "h: this message",
        "lf: list folios",
        "cf <folioName>: create folio",
        "df <folioName>: delete folio",
        "ln <folioName>: list notes in folio",
        "lna <folioName>: list all notes in folio, including done",
        "dn <folioName> <number>: toggle done on note at number",
        "a <folioName> <msg>: append note to folio",
        "e <folioName> <number> <msg>: replace text of note at number",
    ]
    .join("\n")
}

/// Runs a command against the folio service and returns the reply text.
pub async fn execute(cmd: Command, api: &dyn FolioApi) -> Result<String, String> {
    match cmd {
        Command::Help => Ok(help()),
        Command::ListFolios => {
            let names = api.get_folios().await?;
            if names.is_empty() {
                return Ok("No folios yet!".to_string());
            }
            Ok(names.join("\n"))
        }
        Command::CreateFolio(name) => {
            api.create_folio(&name).await?;
            Ok(format!("Created folio with name {}", name))
        }
        Command::DeleteFolio(name) => {
            api.delete_folio(&name).await?;
            Ok("Deleted folio".to_string())
        }
        Command::ListNotes(folio) => {
            let notes = api.get_notes(&folio).await?;
            if notes.is_empty() {
                return Ok("No notes yet!".to_string());
            }
            let open: Vec<String> = notes
                .into_iter()
                .filter(|n| !n.ends_with(DONE_SUFFIX))
                .collect();
            if open.is_empty() {
                return Ok("All notes done!".to_string());
            }
            Ok(open.join("\n"))
        }
        Command::ListAllNotes(folio) => {
            let notes = api.get_notes(&folio).await?;
            if notes.is_empty() {
                return Ok("No notes yet!".to_string());
            }
            Ok(notes.join("\n"))
        }
        Command::ToggleDone { folio, number } => {
            api.toggle_done(&folio, number - 1).await?;
            Ok("Toggled done".to_string())
        }
        Command::Append { folio, text } => {
            api.add_note(&folio, &text).await?;
            Ok("Appended".to_string())
        }
        Command::Edit {
            folio,
            number,
            text,
        } => {
            api.edit_note(&folio, number - 1, &text).await?;
            Ok("Edited".to_string())
        }
    }
}

/// Parses and runs a message; failures become the reply.
pub async fn respond(message: &str, api: &dyn FolioApi) -> String {
    let result = match parse(message) {
        Ok(cmd) => execute(cmd, api).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| e)
}
