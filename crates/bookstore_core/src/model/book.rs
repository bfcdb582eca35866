//! Book entity.
//!
//! # Invariants
//! - `publisher_id` and `seller_id` reference exactly one row each.
//! - `author_ids` keeps caller order; repeats are allowed and each one
//!   becomes its own authorship row.

use super::{
    require_positive_id, require_text, AuthorId, BookId, PublisherId, SellerId, ValidationError,
};
use serde::{Deserialize, Serialize};

/// A catalogued book together with the ids of its relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "super::is_zero")]
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub original_release: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    /// Publication date of this edition.
    #[serde(default)]
    pub published: String,
    pub publisher_id: PublisherId,
    #[serde(default)]
    pub pages: i64,
    /// Serialized as `author_id` to match the external schema naming.
    #[serde(rename = "author_id", default)]
    pub author_ids: Vec<AuthorId>,
    /// Set by the caller from the authenticated seller, never by the client body.
    #[serde(default)]
    pub seller_id: SellerId,
}

impl Book {
    /// Creates an unsaved book with its required relations.
    pub fn new(
        title: impl Into<String>,
        publisher_id: PublisherId,
        author_ids: Vec<AuthorId>,
        seller_id: SellerId,
    ) -> Self {
        Self {
            title: title.into(),
            publisher_id,
            author_ids,
            seller_id,
            ..Self::default()
        }
    }

    /// Checks a book before the compound write.
    ///
    /// Author ids are only checked for shape; existence is enforced by
    /// foreign keys inside the write transaction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_positive_id("publisher_id", self.publisher_id)?;
        require_positive_id("seller_id", self.seller_id)?;
        if self.pages < 0 {
            return Err(ValidationError::NegativePages(self.pages));
        }
        if self.author_ids.is_empty() {
            return Err(ValidationError::MissingAuthors);
        }
        for author_id in &self.author_ids {
            require_positive_id("author_id", *author_id)?;
        }
        Ok(())
    }
}
