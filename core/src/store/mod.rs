//! SQLite table store.
//!
//! RULE: Only the store talks to the database.
//! The engine never executes SQL; it receives CanonicalTables.
//!
//! Loading checks every required column with PRAGMA table_info before
//! reading a row, so schema drift fails loudly as MissingColumn.

mod matches;
mod player_stats;
mod rounds;

use crate::{
    error::{ScoutError, ScoutResult},
    tables::CanonicalTables,
};
use rusqlite::Connection;

pub struct TableStore {
    conn: Connection,
}

impl TableStore {
    /// Open (or create) the table database at `path`.
    pub fn open(path: &str) -> ScoutResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoutResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply the canonical schema.
    pub fn migrate(&self) -> ScoutResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_canonical_tables.sql"))?;
        Ok(())
    }

    /// Raw connection, for normalizer integrations that write their own SQL.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert all three tables in one transaction.
    pub fn insert_tables(&self, tables: &CanonicalTables) -> ScoutResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for m in &tables.matches {
            self.insert_match(m)?;
        }
        for r in &tables.rounds {
            self.insert_round(r)?;
        }
        for p in &tables.player_match_stats {
            self.insert_player_stat(p)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_tables(&self) -> ScoutResult<CanonicalTables> {
        let tables = CanonicalTables {
            matches:            self.load_matches()?,
            rounds:             self.load_rounds()?,
            player_match_stats: self.load_player_stats()?,
        };
        log::info!(
            "loaded {} matches, {} rounds, {} player lines",
            tables.matches.len(),
            tables.rounds.len(),
            tables.player_match_stats.len()
        );
        Ok(tables)
    }

    // ── Schema checks ──────────────────────────────────────────

    fn columns(&self, table: &str) -> ScoutResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Fail with MissingColumn on the first required column not present.
    fn require_columns(&self, table: &str, required: &[&str]) -> ScoutResult<()> {
        let present = self.columns(table)?;
        for column in required {
            if !present.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                log::warn!("table {table} is missing required column {column}");
                return Err(ScoutError::MissingColumn {
                    table:  table.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Reject an unparseable enum or date cell, logging it first.
fn malformed(table: &str, field: &str, detail: String) -> ScoutError {
    log::warn!("rejecting {table}.{field}: {detail}");
    ScoutError::malformed(table, field, detail)
}

/// Integer cells are read wide and narrowed here, so a negative or
/// oversized count names its field.
fn count(table: &str, field: &str, value: i64, at: &str) -> ScoutResult<u32> {
    u32::try_from(value).map_err(|_| malformed(table, field, format!("{value} on {at}")))
}
