//! Persistence for books over a SQLite pool.

use library_http::AppError;
use sqlx::SqlitePool;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::models::{Book, BookDraft};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("book {id} not found")]
    NotFound { id: i64 },

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => AppError::not_found(error.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Handle on the `book` table. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct BookStore {
    pool: SqlitePool,
}

impl BookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All books in insertion order
    pub async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, created_at, updated_at FROM book ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn get(&self, id: i64) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, author, created_at, updated_at FROM book WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { id })
    }

    /// Insert a new book; `created_at` and `updated_at` get the same instant.
    pub async fn create(&self, draft: &BookDraft) -> Result<Book, StoreError> {
        let stamp = OffsetDateTime::now_utc().format(&Rfc3339)?;

        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO book (title, author, created_at, updated_at) VALUES (?, ?, ?, ?) \
             RETURNING id, title, author, created_at, updated_at",
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&stamp)
        .bind(&stamp)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(book_id = book.id, "book row inserted");
        Ok(book)
    }

    /// Replace the writable fields of `existing` and refresh `updated_at`.
    pub async fn update(&self, existing: &Book, draft: &BookDraft) -> Result<Book, StoreError> {
        let stamp = OffsetDateTime::now_utc()
            .max(existing.created_at)
            .format(&Rfc3339)?;

        let book = sqlx::query_as::<_, Book>(
            "UPDATE book SET title = ?, author = ?, updated_at = ? WHERE id = ? \
             RETURNING id, title, author, created_at, updated_at",
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&stamp)
        .bind(existing.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound { id: existing.id })?;

        tracing::debug!(book_id = book.id, "book row updated");
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        tracing::debug!(book_id = id, "book row deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use library_kernel::settings::DatabaseSettings;

    pub(crate) async fn memory_store() -> BookStore {
        let pool = library_db::connect(&DatabaseSettings::in_memory())
            .await
            .unwrap();
        let migrations: Vec<_> = super::super::migrations()
            .into_iter()
            .map(|migration| ("books".to_string(), migration))
            .collect();
        library_db::run_migrations(&pool, &migrations).await.unwrap();
        BookStore::new(pool)
    }

    fn draft(title: &str, author: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[tokio::test]
    async fn create_stamps_matching_timestamps() {
        let store = memory_store().await;
        let book = store.create(&draft("Dune", "Herbert")).await.unwrap();

        assert_eq!(book.created_at, book.updated_at);
        assert_eq!(store.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn list_returns_insertion_order() {
        let store = memory_store().await;
        for title in ["A", "B", "C"] {
            store.create(&draft(title, "Anon")).await.unwrap();
        }

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_moves_updated_at() {
        let store = memory_store().await;
        let original = store.create(&draft("Dune", "Herbert")).await.unwrap();

        let updated = store
            .update(&original, &draft("Dune", "Frank Herbert"))
            .await
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = memory_store().await;
        let ghost = store.create(&draft("Ghost", "Nobody")).await.unwrap();
        store.delete(ghost.id).await.unwrap();

        assert!(matches!(
            store.get(ghost.id).await,
            Err(StoreError::NotFound { id }) if id == ghost.id
        ));
        assert!(matches!(
            store.update(&ghost, &draft("Ghost", "Somebody")).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(ghost.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = memory_store().await;
        let first = store.create(&draft("First", "Anon")).await.unwrap();
        store.delete(first.id).await.unwrap();

        let second = store.create(&draft("Second", "Anon")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn table_rejects_out_of_bounds_text() {
        let store = memory_store().await;
        let result = store.create(&draft("", "Anon")).await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }

    #[test]
    fn not_found_maps_to_404_error() {
        let error = AppError::from(StoreError::NotFound { id: 4 });
        assert_eq!(error.status(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "not found: book 4 not found");
    }
}
