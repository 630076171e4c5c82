//! Database schema and types

pub use crate::state_machine::state::DialogState;
use chrono::NaiveDate;
use std::fmt;

/// SQL schema for initialization
///
/// Both `code` and `url` are unique; the store reports a clash on `code` first.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS mods (
    url         TEXT NOT NULL UNIQUE,
    code        TEXT NOT NULL PRIMARY KEY,
    renew_date  TEXT NOT NULL,
    remove_date TEXT NOT NULL,
    admin       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_mods_admin ON mods(admin);

CREATE TABLE IF NOT EXISTS users (
    id          TEXT NOT NULL PRIMARY KEY,
    state       TEXT,
    code_temp   TEXT,
    msg_temp    TEXT
);
";

/// A registered course discussion group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRegistration {
    /// Invite link to the group
    pub url: String,
    /// Normalised course code, e.g. `CS2103T`
    pub code: String,
    /// When the registration should be reviewed
    pub renew_date: NaiveDate,
    /// When the registration lapses
    pub remove_date: NaiveDate,
    /// User who registered the group
    pub admin: String,
}

/// Stored conversational state of one user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserRecord {
    pub id: String,
    pub state: DialogState,
    /// Scratch column kept for existing rows; no dialog writes it today
    pub msg_temp: Option<String>,
}

impl UserRecord {
    /// A freshly seen user with no dialog in progress
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DialogState::Idle,
            msg_temp: None,
        }
    }
}

/// Unique column of `mods` involved in a key clash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    Code,
    Url,
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyColumn::Code => write!(f, "code"),
            KeyColumn::Url => write!(f, "url"),
        }
    }
}
