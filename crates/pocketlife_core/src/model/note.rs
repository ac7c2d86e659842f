//! Note record.

use crate::model::deletion::{DeletableRecord, DeletionState, RecordId, RecordKind};
use crate::model::{normalize_category, normalize_title, validate_timestamps, RecordValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form note with an optional notebook category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    /// Trimmed, non-blank title.
    pub title: String,
    /// Plain text body. May be empty.
    pub content: String,
    /// Optional notebook label used to scope listings and trash.
    pub category: Option<String>,
    pub deletion: DeletionState,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms. Never earlier than `created_at`.
    pub updated_at: i64,
}

impl Note {
    /// Creates an active note with a generated id.
    pub fn new(
        title: &str,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Result<Self, RecordValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            content: content.into(),
            category: None,
            deletion: DeletionState::Active,
            created_at: now_ms,
            updated_at: now_ms,
        })
    }

    /// Sets the category label, normalizing blank input to `None`.
    pub fn in_category(mut self, category: Option<&str>) -> Self {
        self.category = normalize_category(category);
        self
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::BlankTitle);
        }
        validate_timestamps(self.created_at, self.updated_at)
    }
}

impl DeletableRecord for Note {
    const KIND: RecordKind = RecordKind::Note;

    fn id(&self) -> RecordId {
        self.id
    }

    fn deletion(&self) -> DeletionState {
        self.deletion
    }

    fn set_deletion(&mut self, state: DeletionState) {
        self.deletion = state;
    }
}
