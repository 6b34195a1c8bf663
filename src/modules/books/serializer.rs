//! Book field schema and its serializer.

use serde_json::Value;

use super::models::{Book, BookDraft};
use crate::schema::{self, Field, FieldKind, Record, Representation, ValidationErrors};

pub const TITLE_MAX_LENGTH: usize = 100;
pub const AUTHOR_MAX_LENGTH: usize = 100;

const BOOK_FIELDS: &[Field] = &[
    Field::read_only("id", FieldKind::Integer),
    Field::writable(
        "title",
        FieldKind::Text {
            max_length: TITLE_MAX_LENGTH,
        },
    ),
    Field::writable(
        "author",
        FieldKind::Text {
            max_length: AUTHOR_MAX_LENGTH,
        },
    ),
    Field::read_only("created_at", FieldKind::Timestamp),
    Field::read_only("updated_at", FieldKind::Timestamp),
];

impl Record for Book {
    const FIELDS: &'static [Field] = BOOK_FIELDS;

    fn value_of(&self, field: &Field) -> Value {
        match field.name {
            "id" => Value::from(self.id),
            "title" => Value::String(self.title.clone()),
            "author" => Value::String(self.author.clone()),
            "created_at" => schema::render_timestamp(&self.created_at),
            "updated_at" => schema::render_timestamp(&self.updated_at),
            _ => Value::Null,
        }
    }
}

pub struct BookSerializer;

impl BookSerializer {
    pub fn render(book: &Book) -> Representation {
        schema::render(book)
    }

    pub fn render_many(books: &[Book]) -> Vec<Representation> {
        schema::render_many(books)
    }

    /// Full-record validation: `title` and `author` are both required.
    pub fn validate(payload: &Value) -> Result<BookDraft, ValidationErrors> {
        let mut cleaned = schema::validate(Book::FIELDS, payload)?;
        Ok(BookDraft {
            title: take_text(&mut cleaned, "title"),
            author: take_text(&mut cleaned, "author"),
        })
    }
}

// `schema::validate` guarantees every writable text field is a string.
fn take_text(cleaned: &mut Representation, name: &str) -> String {
    match cleaned.remove(name) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    }
}
