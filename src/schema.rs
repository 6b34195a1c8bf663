//! Declarative field schemas and the generic render/validate routines that
//! consume them.

use library_http::AppError;
use serde::Serialize;
use serde_json::{json, Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Wire form of a record: field name to primitive value, in declaration order.
pub type Representation = Map<String, Value>;

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text { max_length: usize },
    Timestamp,
}

/// One declared field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Rendered on output, ignored on input.
    pub read_only: bool,
}

impl Field {
    pub const fn read_only(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            read_only: true,
        }
    }

    pub const fn writable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            read_only: false,
        }
    }
}

/// A record type described by a static field list.
pub trait Record {
    const FIELDS: &'static [Field];

    /// Value of `field` for this record. Only called with entries of `FIELDS`.
    fn value_of(&self, field: &Field) -> Value;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code,
            message: message.into(),
        }
    }
}

/// Every problem found in one payload, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fields: {}", self.fields().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|error| error.field.as_str()).collect()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field == field)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .0
            .iter()
            .map(|error| {
                json!({
                    "field": error.field,
                    "code": error.code,
                    "message": error.message,
                })
            })
            .collect();
        AppError::validation(details, errors.to_string())
    }
}

pub fn render<R: Record>(record: &R) -> Representation {
    R::FIELDS
        .iter()
        .map(|field| (field.name.to_string(), record.value_of(field)))
        .collect()
}

pub fn render_many<R: Record>(records: &[R]) -> Vec<Representation> {
    records.iter().map(render).collect()
}

pub fn render_timestamp(timestamp: &OffsetDateTime) -> Value {
    timestamp
        .format(&Rfc3339)
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// Check `payload` against the writable entries of `fields`.
///
/// Every writable field is required. Read-only and unknown keys are dropped.
/// On success the cleaned values of the writable fields are returned.
pub fn validate(fields: &[Field], payload: &Value) -> Result<Representation, ValidationErrors> {
    let Some(object) = payload.as_object() else {
        return Err(ValidationErrors(vec![FieldError::new(
            NON_FIELD_ERRORS,
            "invalid",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_kind(payload)
            ),
        )]));
    };

    let mut cleaned = Representation::new();
    let mut errors = Vec::new();

    for field in fields.iter().filter(|field| !field.read_only) {
        match object.get(field.name) {
            None => errors.push(FieldError::new(
                field.name,
                "required",
                "This field is required.",
            )),
            Some(Value::Null) => errors.push(FieldError::new(
                field.name,
                "null",
                "This field may not be null.",
            )),
            Some(value) => match clean_value(field, value) {
                Ok(value) => {
                    cleaned.insert(field.name.to_string(), value);
                }
                Err(error) => errors.push(error),
            },
        }
    }

    if errors.is_empty() {
        Ok(cleaned)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn clean_value(field: &Field, value: &Value) -> Result<Value, FieldError> {
    match field.kind {
        FieldKind::Text { max_length } => {
            let text = match value {
                Value::String(text) => text.trim().to_string(),
                Value::Number(number) => number.to_string(),
                _ => {
                    return Err(FieldError::new(field.name, "invalid", "Not a valid string."));
                }
            };
            if text.is_empty() {
                return Err(FieldError::new(
                    field.name,
                    "blank",
                    "This field may not be blank.",
                ));
            }
            if text.chars().count() > max_length {
                return Err(FieldError::new(
                    field.name,
                    "max_length",
                    format!("Ensure this field has no more than {max_length} characters."),
                ));
            }
            Ok(Value::String(text))
        }
        FieldKind::Integer => {
            let parsed = match value {
                Value::Number(number) => number.as_i64(),
                Value::String(text) => text.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| FieldError::new(field.name, "invalid", "A valid integer is required."))
        }
        FieldKind::Timestamp => value
            .as_str()
            .and_then(|text| OffsetDateTime::parse(text.trim(), &Rfc3339).ok())
            .map(|timestamp| render_timestamp(&timestamp))
            .ok_or_else(|| {
                FieldError::new(
                    field.name,
                    "invalid",
                    "Datetime has wrong format. Use RFC 3339.",
                )
            }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
