//! Author entity.

use super::{require_text, AuthorId, ValidationError};
use serde::{Deserialize, Serialize};

/// A person credited on one or more books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Assigned by the store on save; `0` until then.
    #[serde(default, skip_serializing_if = "super::is_zero")]
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub birthday: String,
    /// Date of death, absent for living authors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<String>,
}

impl Author {
    /// Creates an unsaved author with only the name set.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    /// Checks the fields required before an insert.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }
}
