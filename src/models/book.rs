//! Book (catalog entry) model and validated construction.
//!
//! Input flows loose JSON -> [`CreateBook`] -> [`NewBook`] -> row. Each step
//! rejects instead of coercing: absent/null/mistyped fields fail decoding,
//! oversized or out-of-range values fail validation, and the row is only
//! constructed once every bound holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::error::ConstraintViolation;

/// Maximum stored length of the `name` column
pub const NAME_MAX_LEN: usize = 64;
/// Maximum stored length of the `author` column
pub const AUTHOR_MAX_LEN: usize = 64;
/// Maximum stored length of the `book_type` column
pub const BOOK_TYPE_MAX_LEN: usize = 64;
/// `year_published` is a 32-bit integer column
pub const YEAR_MIN: i64 = i32::MIN as i64;
/// `year_published` is a 32-bit integer column
pub const YEAR_MAX: i64 = i32::MAX as i64;

/// Full book model (DB + API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub year_published: i32,
    pub book_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/replace book request.
///
/// `year_published` is accepted as i64 so an out-of-range year reaches the
/// range check instead of failing opaquely at deserialization.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 64, message = "Name must be 1 to 64 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "Author must be 1 to 64 characters"))]
    pub author: String,
    #[validate(range(
        min = YEAR_MIN,
        max = YEAR_MAX,
        message = "Year must fit a 32-bit integer column"
    ))]
    pub year_published: i64,
    #[validate(length(min = 1, max = 64, message = "Book type must be 1 to 64 characters"))]
    pub book_type: String,
}

/// A validated row ready for insert.
///
/// Produced by [`CreateBook::try_into_new`]; fields are public so the
/// repository can bind them directly (and so tests can probe the schema-level
/// backstop with rows that skipped validation).
#[derive(Debug, Clone)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub year_published: i32,
    pub book_type: String,
}

impl CreateBook {
    /// Decode a loosely typed JSON object without coercion.
    ///
    /// Absent fields and explicit nulls are missing data; any other type
    /// mismatch (number where text is expected, text or float where an
    /// integer is expected) is a type error. Text content is never inspected:
    /// markup, scripts and SQL metacharacters are all valid values.
    pub fn from_json(value: &Value) -> Result<Self, ConstraintViolation> {
        Ok(Self {
            name: text_field(value, "name")?,
            author: text_field(value, "author")?,
            year_published: integer_field(value, "year_published")?,
            book_type: text_field(value, "book_type")?,
        })
    }

    /// Validate bounds and construct the insertable row (reject-or-construct).
    pub fn try_into_new(self) -> Result<NewBook, ConstraintViolation> {
        if let Err(errors) = self.validate() {
            return Err(self.classify(&errors));
        }
        let year_published = i32::try_from(self.year_published).map_err(|_| {
            ConstraintViolation::RangeExceeded {
                field: "year_published".to_string(),
            }
        })?;
        Ok(NewBook {
            name: self.name,
            author: self.author,
            year_published,
            book_type: self.book_type,
        })
    }

    /// Turn validator output into the constraint taxonomy, reporting the
    /// first offending field in declaration order.
    fn classify(&self, errors: &ValidationErrors) -> ConstraintViolation {
        let fields = errors.field_errors();
        for (field, value, max) in [
            ("name", &self.name, NAME_MAX_LEN),
            ("author", &self.author, AUTHOR_MAX_LEN),
            ("book_type", &self.book_type, BOOK_TYPE_MAX_LEN),
        ] {
            if !fields.contains_key(field) {
                continue;
            }
            if value.is_empty() {
                return ConstraintViolation::MissingRequiredField {
                    field: field.to_string(),
                };
            }
            return ConstraintViolation::LengthExceeded {
                field: field.to_string(),
                length: value.chars().count(),
                max,
            };
        }
        // Only the year carries a range constraint.
        ConstraintViolation::RangeExceeded {
            field: "year_published".to_string(),
        }
    }
}

fn text_field(value: &Value, field: &str) -> Result<String, ConstraintViolation> {
    match value.get(field) {
        None | Some(Value::Null) => Err(ConstraintViolation::MissingRequiredField {
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ConstraintViolation::TypeMismatch {
            field: field.to_string(),
        }),
    }
}

fn integer_field(value: &Value, field: &str) -> Result<i64, ConstraintViolation> {
    match value.get(field) {
        None | Some(Value::Null) => Err(ConstraintViolation::MissingRequiredField {
            field: field.to_string(),
        }),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| ConstraintViolation::TypeMismatch {
            field: field.to_string(),
        }),
        Some(_) => Err(ConstraintViolation::TypeMismatch {
            field: field.to_string(),
        }),
    }
}

/// Book query parameters (API). All filters are exact-match.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub name: Option<String>,
    pub author: Option<String>,
    pub year_published: Option<i32>,
    pub book_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
