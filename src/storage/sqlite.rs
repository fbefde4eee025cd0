//! SQLite link writer
//!
//! Appends accepted links to the `links` table with a discovery timestamp.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LinkWriter, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// Writer that appends links to a SQLite database
pub struct SqliteLinkWriter {
    conn: Connection,
}

impl SqliteLinkWriter {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of rows in the links table
    pub fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All stored URLs in insertion order
    pub fn stored_links(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM links ORDER BY id")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }
}

impl LinkWriter for SqliteLinkWriter {
    fn write_link(&mut self, url: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO links (url, discovered_at) VALUES (?1, ?2)",
            params![url, now],
        )?;
        Ok(())
    }
}
