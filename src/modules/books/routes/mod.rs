//! HTTP routes for the books module.

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::get,
    Router,
};
use library_http::{ApiResponse, AppError};
use serde_json::Value;

use super::handlers::{BookDetailView, BooksView};
use super::store::BookStore;

#[derive(Clone)]
struct BooksState {
    collection: BooksView,
    detail: BookDetailView,
}

/// `/` for the collection, `/{id}/` for a single book. Other verbs on these
/// paths answer 405.
pub fn router(store: BookStore) -> Router {
    let state = BooksState {
        collection: BooksView::new(store.clone()),
        detail: BookDetailView::new(store),
    };

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}/",
            get(retrieve_book).patch(update_book).delete(delete_book),
        )
        .with_state(state)
}

async fn list_books(State(state): State<BooksState>) -> Result<ApiResponse, AppError> {
    state.collection.list().await
}

async fn create_book(
    State(state): State<BooksState>,
    body: Bytes,
) -> Result<ApiResponse, AppError> {
    let payload = parse_payload(&body)?;
    state.collection.create(&payload).await
}

async fn retrieve_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, AppError> {
    state.detail.retrieve(parse_id(&id)?).await
}

async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse, AppError> {
    let id = parse_id(&id)?;
    let payload = parse_payload(&body)?;
    state.detail.update(id, &payload).await
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, AppError> {
    state.detail.delete(parse_id(&id)?).await
}

/// Only plain decimal ids route to a book; anything else is an unknown path.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::not_found(format!("no route for book id '{raw}'")));
    }
    raw.parse()
        .map_err(|_| AppError::not_found(format!("book {raw} not found")))
}

/// An empty body counts as an empty object so validation reports each field.
fn parse_payload(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|err| AppError::bad_request(format!("malformed JSON: {err}")))
}
