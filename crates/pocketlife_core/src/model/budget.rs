//! Budget item record.

use crate::model::deletion::{DeletableRecord, DeletionState, RecordId, RecordKind};
use crate::model::{normalize_category, normalize_title, validate_timestamps, RecordValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of money flow for one budget entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// One income or expense line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: RecordId,
    pub title: String,
    /// Unsigned minor-unit amount; sign comes from `kind`.
    pub amount_cents: i64,
    pub kind: EntryKind,
    pub category: Option<String>,
    pub deletion: DeletionState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BudgetItem {
    /// Creates an active budget item with a generated id.
    pub fn new(
        title: &str,
        amount_cents: i64,
        kind: EntryKind,
        now_ms: i64,
    ) -> Result<Self, RecordValidationError> {
        let item = Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            amount_cents,
            kind,
            category: None,
            deletion: DeletionState::Active,
            created_at: now_ms,
            updated_at: now_ms,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn in_category(mut self, category: Option<&str>) -> Self {
        self.category = normalize_category(category);
        self
    }

    /// Amount with income positive and expense negative.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            EntryKind::Income => self.amount_cents,
            EntryKind::Expense => -self.amount_cents,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.title.trim().is_empty() {
            return Err(RecordValidationError::BlankTitle);
        }
        if self.amount_cents < 0 {
            return Err(RecordValidationError::NegativeAmount(self.amount_cents));
        }
        validate_timestamps(self.created_at, self.updated_at)
    }
}

impl DeletableRecord for BudgetItem {
    const KIND: RecordKind = RecordKind::BudgetItem;

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

#[cfg(test)]
mod tests {
    use super::{BudgetItem, EntryKind};
    use crate::model::RecordValidationError;

    #[test]
    fn signed_amount_follows_kind() {
        let salary = BudgetItem::new("Salary", 250_000, EntryKind::Income, 0).unwrap();
        let rent = BudgetItem::new("Rent", 120_000, EntryKind::Expense, 0).unwrap();
        assert_eq!(salary.signed_amount(), 250_000);
        assert_eq!(rent.signed_amount(), -120_000);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = BudgetItem::new("Refund", -5, EntryKind::Income, 0).unwrap_err();
        assert_eq!(err, RecordValidationError::NegativeAmount(-5));
    }

    #[test]
    fn entry_kind_round_trips_through_storage_text() {
        for kind in [EntryKind::Income, EntryKind::Expense] {
            assert_eq!(EntryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::parse("transfer"), None);
    }
}
