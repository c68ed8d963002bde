use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest publication year accepted
pub const MIN_YEAR: i32 = 0;
/// Latest publication year accepted
pub const MAX_YEAR: i32 = 2026;

/// A row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Identifier assigned by storage
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
}

/// Payload for `POST /books`. Omitted fields default to empty values so they
/// surface as validation failures rather than JSON errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub year: i32,
}

/// Payload for `PUT /books/{id}`; replaces every column of the row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Blank { field: &'static str },

    #[error("year must be between {} and {}", MIN_YEAR, MAX_YEAR)]
    YearOutOfRange { year: i32 },
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.author, self.year)
    }
}

impl UpdateBookRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.author, self.year)
    }
}

fn validate_fields(title: &str, author: &str, year: i32) -> Result<(), ValidationError> {
    require("title", title)?;
    require("author", author)?;

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange { year });
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}
