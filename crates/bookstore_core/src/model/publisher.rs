//! Publisher entity.

use super::{require_text, PublisherId, ValidationError};
use serde::{Deserialize, Serialize};

/// A publishing house. Books reference exactly one publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "super::is_zero")]
    pub id: PublisherId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slogan: String,
    /// Founding date, caller-formatted.
    #[serde(default)]
    pub founded: String,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}
