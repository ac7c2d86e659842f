//! Soft-delete state shared by all deletable record kinds.
//!
//! # Responsibility
//! - Represent the Active/Deleted lifecycle state of one record.
//! - Map that state to and from the two persisted columns
//!   (`is_deleted`, `deleted_at`).
//!
//! # Invariants
//! - `deleted_at` exists iff the record is deleted.
//! - Soft-deleting an already deleted state keeps the original timestamp.

use crate::clock::duration_to_ms;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use uuid::Uuid;

/// Stable identifier of any deletable record.
pub type RecordId = Uuid;

/// Record kinds managed by the trash lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Note,
    BudgetItem,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::BudgetItem => "budget_item",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeletionState {
    /// Visible to feature code.
    #[default]
    Active,
    /// In the trash since `deleted_at` (epoch ms).
    Deleted { deleted_at: i64 },
}

impl DeletionState {
    /// Rebuilds state from persisted columns.
    ///
    /// Returns `None` when the columns disagree with each other.
    pub fn from_columns(is_deleted: bool, deleted_at: Option<i64>) -> Option<Self> {
        match (is_deleted, deleted_at) {
            (false, None) => Some(Self::Active),
            (true, Some(deleted_at)) => Some(Self::Deleted { deleted_at }),
            _ => None,
        }
    }

    /// Splits state into `(is_deleted, deleted_at)` column values.
    pub fn to_columns(self) -> (bool, Option<i64>) {
        (self.is_deleted(), self.deleted_at())
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    pub fn deleted_at(self) -> Option<i64> {
        match self {
            Self::Active => None,
            Self::Deleted { deleted_at } => Some(deleted_at),
        }
    }

    /// Moves to `Deleted` stamped at `now_ms`; a deleted state is unchanged.
    pub fn soft_deleted(self, now_ms: i64) -> Self {
        match self {
            Self::Active => Self::Deleted { deleted_at: now_ms },
            deleted @ Self::Deleted { .. } => deleted,
        }
    }

    /// Moves back to `Active`.
    pub fn restored(self) -> Self {
        Self::Active
    }

    /// Whether this record has been in the trash for longer than `retention`.
    pub fn is_expired(self, now_ms: i64, retention: Duration) -> bool {
        match self {
            Self::Active => false,
            Self::Deleted { deleted_at } => {
                now_ms.saturating_sub(deleted_at) > duration_to_ms(retention)
            }
        }
    }
}

/// Contract every record kind fulfils to be managed by the lifecycle service.
///
/// The service only ever touches the deletion state; payload fields stay
/// owned by the feature that defines the record.
pub trait DeletableRecord: Clone {
    const KIND: RecordKind;

    fn id(&self) -> RecordId;
    fn deletion(&self) -> DeletionState;
    fn set_deletion(&mut self, state: DeletionState);

    fn is_deleted(&self) -> bool {
        self.deletion().is_deleted()
    }
}

#[cfg(test)]
mod tests {
    use super::DeletionState;
    use std::time::Duration;

    #[test]
    fn columns_must_agree() {
        assert_eq!(
            DeletionState::from_columns(false, None),
            Some(DeletionState::Active)
        );
        assert_eq!(
            DeletionState::from_columns(true, Some(5)),
            Some(DeletionState::Deleted { deleted_at: 5 })
        );
        assert_eq!(DeletionState::from_columns(true, None), None);
        assert_eq!(DeletionState::from_columns(false, Some(5)), None);
    }

    #[test]
    fn soft_delete_keeps_first_timestamp() {
        let deleted = DeletionState::Active.soft_deleted(100);
        assert_eq!(deleted.soft_deleted(200).deleted_at(), Some(100));
        assert_eq!(deleted.restored(), DeletionState::Active);
        assert_eq!(deleted.to_columns(), (true, Some(100)));
    }

    #[test]
    fn expiry_is_strictly_after_retention() {
        let retention = Duration::from_secs(10);
        let state = DeletionState::Deleted { deleted_at: 0 };

        assert!(!state.is_expired(10_000, retention));
        assert!(state.is_expired(10_001, retention));
        assert!(!DeletionState::Active.is_expired(i64::MAX, retention));
    }
}
