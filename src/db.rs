//! Database module for the group registry
//!
//! Provides persistence for group registrations and per-user dialog state.

mod schema;

pub use schema::*;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Duplicate key on column: {0}")]
    DuplicateKey(KeyColumn),
    #[error("Invalid code pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

const MOD_COLUMNS: &str = "url, code, renew_date, remove_date, admin";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or the schema cannot be applied.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be applied.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ==================== Registration Operations ====================

    /// Get a registration by its course code
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error, including unparseable dates.
    pub fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {MOD_COLUMNS} FROM mods WHERE code = ?1"))?;
        stmt.query_row(params![code], parse_mod_row)
            .optional()
            .map_err(DbError::from)
    }

    /// All registrations made by a user
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error.
    pub fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MOD_COLUMNS} FROM mods WHERE admin = ?1 ORDER BY rowid ASC"
        ))?;

        let rows = stmt.query_map(params![user_id], parse_mod_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Registrations whose code contains a match for `pattern`, in insertion order.
    ///
    /// The listing only ever passes the empty pattern, which matches everything.
    ///
    /// # Errors
    ///
    /// `DbError::InvalidPattern` if `pattern` is not a valid regex, otherwise a
    /// poisoned lock or a database error.
    pub fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>> {
        let filter = Regex::new(pattern)?;
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {MOD_COLUMNS} FROM mods ORDER BY rowid ASC"))?;

        let rows = stmt.query_map([], parse_mod_row)?;
        let mods = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(mods.into_iter().filter(|m| filter.is_match(&m.code)).collect())
    }

    /// Insert a new registration.
    ///
    /// # Errors
    ///
    /// `DbError::DuplicateKey` naming the clashing column; `code` is checked first.
    pub fn add_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        let conn = self.lock()?;

        if row_exists(&conn, "SELECT EXISTS(SELECT 1 FROM mods WHERE code = ?1)", &registration.code)? {
            return Err(DbError::DuplicateKey(KeyColumn::Code));
        }
        if row_exists(&conn, "SELECT EXISTS(SELECT 1 FROM mods WHERE url = ?1)", &registration.url)? {
            return Err(DbError::DuplicateKey(KeyColumn::Url));
        }

        conn.execute(
            &format!("INSERT INTO mods ({MOD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                registration.url,
                registration.code,
                registration.renew_date.to_string(),
                registration.remove_date.to_string(),
                registration.admin,
            ],
        )?;

        tracing::info!(
            code = %registration.code,
            admin = %registration.admin,
            "Registered group"
        );
        Ok(())
    }

    /// Insert or overwrite a registration keyed by its code
    ///
    /// # Errors
    ///
    /// `DbError::DuplicateKey(KeyColumn::Url)` if another code owns the url.
    pub fn update_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        let conn = self.lock()?;

        // The url may only move with its own code
        let url_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM mods WHERE url = ?1 AND code != ?2)",
            params![registration.url, registration.code],
            |row| row.get(0),
        )?;
        if url_taken {
            return Err(DbError::DuplicateKey(KeyColumn::Url));
        }

        conn.execute(
            &format!(
                "INSERT INTO mods ({MOD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(code) DO UPDATE SET
                    url = excluded.url,
                    renew_date = excluded.renew_date,
                    remove_date = excluded.remove_date,
                    admin = excluded.admin"
            ),
            params![
                registration.url,
                registration.code,
                registration.renew_date.to_string(),
                registration.remove_date.to_string(),
                registration.admin,
            ],
        )?;
        Ok(())
    }

    /// Remove a registration; absent codes are ignored
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error.
    pub fn delete_mod(&self, code: &str) -> DbResult<()> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM mods WHERE code = ?1", params![code])?;
        if deleted > 0 {
            tracing::info!(code = %code, "Removed group registration");
        }
        Ok(())
    }

    // ==================== User Operations ====================

    /// Get a user's dialog state, creating a default row on first sight
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error.
    pub fn get_user(&self, user_id: &str) -> DbResult<UserRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, state, code_temp, msg_temp) VALUES (?1, NULL, NULL, NULL)",
            params![user_id],
        )?;

        let mut stmt =
            conn.prepare("SELECT id, state, code_temp, msg_temp FROM users WHERE id = ?1")?;
        stmt.query_row(params![user_id], |row| {
            let state: Option<String> = row.get(1)?;
            Ok(UserRecord {
                id: row.get(0)?,
                state: DialogState::from_columns(state.as_deref(), row.get(2)?),
                msg_temp: row.get(3)?,
            })
        })
        .map_err(DbError::from)
    }

    /// Record a user if not yet known; existing rows are left untouched
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error.
    pub fn add_user(&self, user_id: &str) -> DbResult<()> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (id, state, code_temp, msg_temp) VALUES (?1, NULL, NULL, NULL)",
            params![user_id],
        )?;
        if inserted > 0 {
            tracing::debug!(user_id = %user_id, "New user");
        }
        Ok(())
    }

    /// Create or overwrite a user's dialog state
    ///
    /// # Errors
    ///
    /// Fails on a poisoned lock or a database error.
    pub fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()> {
        let conn = self.lock()?;
        let (tag, code_temp) = state.to_columns();

        conn.execute(
            "INSERT INTO users (id, state, code_temp, msg_temp) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                code_temp = excluded.code_temp,
                msg_temp = excluded.msg_temp",
            params![user_id, tag, code_temp, msg_temp],
        )?;
        Ok(())
    }
}

fn row_exists(conn: &Connection, sql: &str, value: &str) -> DbResult<bool> {
    conn.query_row(sql, params![value], |row| row.get(0))
        .map_err(DbError::from)
}

/// Parse a registration row selected with `MOD_COLUMNS`
fn parse_mod_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModRegistration> {
    Ok(ModRegistration {
        url: row.get(0)?,
        code: row.get(1)?,
        renew_date: parse_date(row, 2)?,
        remove_date: parse_date(row, 3)?,
        admin: row.get(4)?,
    })
}

fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    text.parse::<NaiveDate>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
