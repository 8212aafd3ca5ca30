use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::product::ComparisonResult;

/// Safely convert a Unix timestamp to DateTime<Utc>, falling back to current time if invalid
fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// One distinct query in the search history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub query: String,
    pub first_searched_at: DateTime<Utc>,
    pub last_searched_at: DateTime<Utc>,
    /// Products found the last time the query ran
    pub results_count: usize,
    /// How many times the query was searched
    pub search_count: u64,
}

/// Search history store
pub struct History {
    conn: Connection,
}

impl History {
    /// Open or create the history database at the configured location
    pub fn open() -> Result<Self> {
        Self::open_at(&Config::db_path()?)
    }

    /// Open or create a history database at `path`
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;

        // Run migrations
        embedded::migrations::runner().run(&mut conn)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        embedded::migrations::runner().run(&mut conn)?;
        Ok(Self { conn })
    }

    /// Record a search; repeated queries update the existing entry
    pub fn record(&self, query: &str, results_count: usize) -> Result<()> {
        self.record_at(query, results_count, Utc::now())
    }

    /// Record a search with the number of products left after filtering
    pub fn record_result(&self, query: &str, result: &ComparisonResult) -> Result<()> {
        self.record(query, result.all_products.len())
    }

    fn record_at(&self, query: &str, results_count: usize, at: DateTime<Utc>) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        self.conn.execute(
            "INSERT INTO searches (query, first_searched_at, last_searched_at, results_count, search_count)
             VALUES (?1, ?2, ?2, ?3, 1)
             ON CONFLICT(query) DO UPDATE SET
                last_searched_at = excluded.last_searched_at,
                results_count = excluded.results_count,
                search_count = search_count + 1",
            params![query, at.timestamp(), results_count as i64],
        )?;
        Ok(())
    }

    /// Most recent searches first
    pub fn recent(&self, limit: usize) -> Result<Vec<SearchEntry>> {
        self.query_entries(
            "SELECT query, first_searched_at, last_searched_at, results_count, search_count
             FROM searches ORDER BY last_searched_at DESC, id DESC LIMIT ?1",
            limit,
        )
    }

    /// Most frequently searched queries first
    pub fn top(&self, limit: usize) -> Result<Vec<SearchEntry>> {
        self.query_entries(
            "SELECT query, first_searched_at, last_searched_at, results_count, search_count
             FROM searches ORDER BY search_count DESC, last_searched_at DESC, id DESC LIMIT ?1",
            limit,
        )
    }

    fn query_entries(&self, sql: &str, limit: usize) -> Result<Vec<SearchEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (query, first, last, results_count, search_count) = row?;
            entries.push(SearchEntry {
                query,
                first_searched_at: timestamp_to_datetime(first),
                last_searched_at: timestamp_to_datetime(last),
                results_count: results_count.max(0) as usize,
                search_count: search_count.max(0) as u64,
            });
        }
        Ok(entries)
    }

    /// Delete all history, returning the number of entries removed
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM searches", [])?;
        Ok(removed)
    }
}
