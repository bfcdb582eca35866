//! Catalog domain model.
//!
//! # Responsibility
//! - Define the entity records (author, publisher, book), the junction rows
//!   linking them, and the read-only denormalized views.
//! - Own input validation that must pass before any store interaction.
//!
//! # Invariants
//! - Entity ids are store-assigned surrogate keys; `0` means "not saved yet".
//! - Denormalized views are assembled per request and never persisted.

pub mod author;
pub mod book;
pub mod publisher;
pub mod views;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identity of an author row.
pub type AuthorId = i64;
/// Store-assigned identity of a publisher row.
pub type PublisherId = i64;
/// Store-assigned identity of a book row.
pub type BookId = i64;
/// Caller-supplied identity of the seller listing a book.
pub type SellerId = i64;

/// Input rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    BlankField(&'static str),
    /// A reference id is zero or negative.
    NonPositiveId { field: &'static str, value: i64 },
    /// Page count is negative.
    NegativePages(i64),
    /// A book must list at least one author.
    MissingAuthors,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::NonPositiveId { field, value } => {
                write!(f, "`{field}` must be a positive id, got {value}")
            }
            Self::NegativePages(value) => write!(f, "`pages` must not be negative, got {value}"),
            Self::MissingAuthors => write!(f, "a book must list at least one author id"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_positive_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositiveId { field, value });
    }
    Ok(())
}

pub(crate) fn is_zero(value: &i64) -> bool {
    *value == 0
}
