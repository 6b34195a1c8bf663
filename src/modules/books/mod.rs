pub mod handlers;
pub mod models;
pub mod routes;
pub mod serializer;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Migration, Module};
use serde_json::json;

pub use models::{Book, BookDraft};
pub use store::{BookStore, StoreError};

/// Book catalogue: CRUD over the `book` table
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }
}

/// Schema for the `book` table
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS book (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                title      TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
                author     TEXT NOT NULL CHECK (length(author) BETWEEN 1 AND 100),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
    }]
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };
        let book_input = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input.clone(),
                        "responses": {
                            "201": book("Created book"),
                            "400": error("Validation error or malformed JSON")
                        }
                    }
                },
                "/{id}/": {
                    "parameters": id_param,
                    "get": {
                        "summary": "Retrieve a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": book("The book"),
                            "404": error("Book not found")
                        }
                    },
                    "patch": {
                        "summary": "Replace a book's title and author",
                        "tags": ["Books"],
                        "requestBody": book_input,
                        "responses": {
                            "200": book("Updated book"),
                            "400": error("Validation error or malformed JSON"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64", "readOnly": true },
                            "title": { "type": "string", "maxLength": 100 },
                            "author": { "type": "string", "maxLength": 100 },
                            "created_at": { "type": "string", "format": "date-time", "readOnly": true },
                            "updated_at": { "type": "string", "format": "date-time", "readOnly": true }
                        },
                        "required": ["id", "title", "author", "created_at", "updated_at"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": 100 },
                            "author": { "type": "string", "minLength": 1, "maxLength": 100 }
                        },
                        "required": ["title", "author"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}
