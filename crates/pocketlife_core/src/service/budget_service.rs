//! Budget use-case service.
//!
//! # Invariants
//! - Balances only count active items; trashed entries never affect totals.

use crate::clock::{Clock, SystemClock};
use crate::model::budget::{BudgetItem, EntryKind};
use crate::model::deletion::RecordId;
use crate::model::RecordValidationError;
use crate::repo::{RecordFilter, RecordStore, RepoError, RepoResult, TrashScope};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request model for one new budget entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetEntryRequest {
    pub title: String,
    pub amount_cents: i64,
    pub kind: EntryKind,
    pub category: Option<String>,
}

#[derive(Debug)]
pub enum BudgetServiceError {
    Validation(RecordValidationError),
    /// Active totals do not fit in `i64` cents.
    BalanceOverflow,
    Repo(RepoError),
}

impl Display for BudgetServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::BalanceOverflow => write!(f, "balance exceeds the representable range"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BudgetServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::BalanceOverflow => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for BudgetServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BudgetServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Budget service facade over a budget item store.
pub struct BudgetService<S: RecordStore<Record = BudgetItem>, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RecordStore<Record = BudgetItem>, C: Clock> BudgetService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Records one income or expense entry.
    pub fn record_entry(
        &self,
        request: &BudgetEntryRequest,
    ) -> Result<BudgetItem, BudgetServiceError> {
        let item = BudgetItem::new(
            &request.title,
            request.amount_cents,
            request.kind,
            self.clock.now_ms(),
        )?
        .in_category(request.category.as_deref());
        self.store.insert(&item)?;
        info!(
            "event=budget_entry_create module=budget status=ok id={} kind={}",
            item.id,
            item.kind.as_str()
        );
        Ok(item)
    }

    pub fn get_item(&self, id: RecordId) -> RepoResult<Option<BudgetItem>> {
        self.store.get(id)
    }

    /// Lists active items within `scope`.
    pub fn list_items(&self, scope: &TrashScope) -> RepoResult<Vec<BudgetItem>> {
        self.store.fetch(&RecordFilter::active().within(scope))
    }

    /// Lists trashed items within `scope`, most recently deleted first.
    pub fn list_trash(&self, scope: &TrashScope) -> RepoResult<Vec<BudgetItem>> {
        self.store.fetch(&RecordFilter::deleted().within(scope))
    }

    /// Income minus expense over active items, in cents.
    ///
    /// # Errors
    /// - `BalanceOverflow` when the running total leaves `i64`.
    pub fn balance(&self, scope: &TrashScope) -> Result<i64, BudgetServiceError> {
        self.list_items(scope)?
            .iter()
            .try_fold(0_i64, |total, item| total.checked_add(item.signed_amount()))
            .ok_or(BudgetServiceError::BalanceOverflow)
    }
}
