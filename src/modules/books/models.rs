use std::fmt;

use sqlx::{sqlite::SqliteRow, FromRow, Row};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// A persisted book. Only the store constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Assigned by the table, never reused
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: OffsetDateTime,
    /// Refreshed on every write; never earlier than `created_at`
    pub updated_at: OffsetDateTime,
}

/// Validated writable fields of a book, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
}

impl Book {
    /// This book with `draft` applied, as an update would store it (minus
    /// the refreshed `updated_at`).
    pub fn with_draft(&self, draft: BookDraft) -> Self {
        Self {
            title: draft.title,
            author: draft.author,
            ..self.clone()
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

// Timestamps are stored as RFC 3339 text so sub-second precision survives.
fn timestamp_column(row: &SqliteRow, column: &str) -> Result<OffsetDateTime, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    OffsetDateTime::parse(&raw, &Rfc3339).map_err(|source| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    })
}
