//! Endpoint handlers for the book collection and for single books.
//!
//! Handlers take already-decoded input and return an [`ApiResponse`];
//! routing and body decoding live in `routes`.

use library_http::{ApiResponse, AppError};
use serde_json::Value;

use super::serializer::BookSerializer;
use super::store::BookStore;

/// `GET /` and `POST /`
#[derive(Debug, Clone)]
pub struct BooksView {
    store: BookStore,
}

impl BooksView {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<ApiResponse, AppError> {
        let books = self.store.list().await?;
        let rendered = BookSerializer::render_many(&books)
            .into_iter()
            .map(Value::Object)
            .collect();
        Ok(ApiResponse::ok(Value::Array(rendered)))
    }

    pub async fn create(&self, payload: &Value) -> Result<ApiResponse, AppError> {
        let draft = BookSerializer::validate(payload)?;
        let book = self.store.create(&draft).await?;

        tracing::info!(book_id = book.id, "book created");
        Ok(ApiResponse::created(Value::Object(BookSerializer::render(
            &book,
        ))))
    }
}

/// `GET`, `PATCH` and `DELETE` on `/<id>/`
#[derive(Debug, Clone)]
pub struct BookDetailView {
    store: BookStore,
}

impl BookDetailView {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }

    pub async fn retrieve(&self, id: i64) -> Result<ApiResponse, AppError> {
        let book = self.store.get(id).await?;
        Ok(ApiResponse::ok(Value::Object(BookSerializer::render(&book))))
    }

    /// Full replacement: the payload must carry every writable field.
    pub async fn update(&self, id: i64, payload: &Value) -> Result<ApiResponse, AppError> {
        let existing = self.store.get(id).await?;
        let draft = BookSerializer::validate(payload)?;
        let book = self.store.update(&existing, &draft).await?;

        tracing::info!(book_id = book.id, "book updated");
        Ok(ApiResponse::ok(Value::Object(BookSerializer::render(&book))))
    }

    pub async fn delete(&self, id: i64) -> Result<ApiResponse, AppError> {
        let book = self.store.get(id).await?;
        self.store.delete(book.id).await?;

        tracing::info!(book_id = book.id, "book deleted");
        Ok(ApiResponse::no_content())
    }
}
