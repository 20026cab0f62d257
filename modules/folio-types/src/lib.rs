//! Shared types for the folio service and its clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Request Forms (application/x-www-form-urlencoded)
// =====================================================

/// Body of `POST /folios`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolioForm {
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /folios/{name}` and `PUT /folios/{name}/{index}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub note: String,
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub folio_count: usize,
}

// =====================================================
// Naming
// =====================================================

pub const INVALID_NAME_MESSAGE: &str = "Invalid folio name, must be one word";
pub const DUPLICATE_NAME_MESSAGE: &str = "Folio with name exists, try a different name";

/// Folio names are a single word of ASCII letters (`^[A-Za-z]+$`).
pub fn is_valid_folio_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic())
}
