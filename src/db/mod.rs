pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// The two record collections kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Lists,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Lists => "lists",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.migrate()?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if version > SCHEMA_VERSION {
            return Err(DbError::Migration(format!(
                "database schema v{version} is newer than this build (v{SCHEMA_VERSION})"
            )));
        }
        if version < 1 {
            self.create_v1()?;
        }

        self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// V1: items + lists. Schema evolution beyond store creation is not supported.
    fn create_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS items (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL DEFAULT '',
                year        INTEGER,
                genre       TEXT NOT NULL DEFAULT '',
                type        TEXT NOT NULL DEFAULT '',
                format      TEXT NOT NULL DEFAULT '',
                region      TEXT NOT NULL DEFAULT '',
                runtime     TEXT NOT NULL DEFAULT '',
                audio       TEXT NOT NULL DEFAULT '',
                hdr         TEXT NOT NULL DEFAULT '',
                languages   TEXT NOT NULL DEFAULT '',
                subtitles   TEXT NOT NULL DEFAULT '',
                edition     TEXT NOT NULL DEFAULT '',
                discs       INTEGER,
                barcode     TEXT NOT NULL DEFAULT '',
                packaging   TEXT NOT NULL DEFAULT '',
                poster      TEXT NOT NULL DEFAULT '',
                notes       TEXT NOT NULL DEFAULT '',
                custom      TEXT NOT NULL DEFAULT '{}' -- JSON object
            );

            CREATE INDEX IF NOT EXISTS idx_items_title ON items(title);
            CREATE INDEX IF NOT EXISTS idx_items_type ON items(type);

            CREATE TABLE IF NOT EXISTS lists (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                item_ids    TEXT NOT NULL DEFAULT '[]' -- JSON array, insertion order
            );

            CREATE INDEX IF NOT EXISTS idx_lists_name ON lists(name);
            ",
        )?;
        Ok(())
    }
}

const SCHEMA_VERSION: i32 = 1;
