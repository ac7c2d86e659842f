//! Domain model for records that participate in the trash lifecycle.
//!
//! # Responsibility
//! - Define the note and budget item records and their payload validation.
//! - Define the soft-delete state shared by every deletable record kind.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - A record is either active or deleted with a deletion timestamp; the two
//!   cannot disagree (see `DeletionState`).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod budget;
pub mod deletion;
pub mod note;

/// Payload validation failure for a record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Title is empty after trimming.
    BlankTitle,
    /// Budget amounts are stored unsigned; direction lives in `EntryKind`.
    NegativeAmount(i64),
    /// `updated_at` precedes `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::NegativeAmount(value) => {
                write!(f, "amount_cents must be >= 0, got {value}")
            }
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// Trims a title and rejects blank input.
pub fn normalize_title(title: &str) -> Result<String, RecordValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RecordValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

/// Trims a category label; blank labels mean "uncategorized".
pub fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_timestamps(
    created_at: i64,
    updated_at: i64,
) -> Result<(), RecordValidationError> {
    if updated_at < created_at {
        return Err(RecordValidationError::TimestampOrder {
            created_at,
            updated_at,
        });
    }
    Ok(())
}
