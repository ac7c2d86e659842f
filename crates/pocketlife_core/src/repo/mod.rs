//! Record store contract and SQLite implementations.
//!
//! # Responsibility
//! - Define the `RecordStore` contract (`fetch/get/insert/save/delete`) the
//!   lifecycle service depends on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate the record before any SQL mutation.
//! - Read paths reject rows whose soft-delete columns disagree instead of
//!   masking them.
//! - `save` and `delete` are single statements, so each is atomic on its
//!   own. No cross-record transaction is offered.

use crate::db::DbError;
use crate::model::deletion::{DeletableRecord, RecordId};
use crate::model::{normalize_category, RecordValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod budget_repo;
pub mod note_repo;
mod sqlite;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error for record stores.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be turned into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which side of the trash a fetch looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionFilter {
    #[default]
    Active,
    Deleted,
    Any,
}

/// Optional narrowing of trash and list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrashScope {
    /// Exact category match after Unicode lowercasing on both sides.
    pub category: Option<String>,
}

impl TrashScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: &str) -> Self {
        Self {
            category: normalize_category(Some(category)),
        }
    }
}

/// Predicate for `RecordStore::fetch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub state: DeletionFilter,
    pub category: Option<String>,
    /// Only records with `deleted_at` strictly earlier than this (epoch ms).
    pub deleted_before: Option<i64>,
}

impl RecordFilter {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn deleted() -> Self {
        Self {
            state: DeletionFilter::Deleted,
            ..Self::default()
        }
    }

    pub fn any() -> Self {
        Self {
            state: DeletionFilter::Any,
            ..Self::default()
        }
    }

    /// Deleted records whose deletion time is strictly before `cutoff_ms`.
    pub fn expired(cutoff_ms: i64) -> Self {
        Self {
            deleted_before: Some(cutoff_ms),
            ..Self::deleted()
        }
    }

    pub fn within(mut self, scope: &TrashScope) -> Self {
        self.category = scope.category.clone();
        self
    }

    /// Whether a record filed under `category` passes the category clause.
    ///
    /// SQLite `NOCASE` only folds ASCII, so stores apply this in Rust.
    pub fn matches_category(&self, category: Option<&str>) -> bool {
        match (self.category.as_deref(), category) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.to_lowercase() == actual.to_lowercase(),
            (Some(_), None) => false,
        }
    }
}

/// Persistence contract consumed by lifecycle and feature services.
pub trait RecordStore {
    type Record: DeletableRecord;

    /// Returns records matching `filter`. Callers must not rely on order.
    fn fetch(&self, filter: &RecordFilter) -> RepoResult<Vec<Self::Record>>;
    /// Ids of records matching `filter`, for batch purges.
    ///
    /// A row whose id cannot be read yields an `Err` entry rather than
    /// failing the whole call, so one damaged row never blocks the rest.
    fn fetch_ids(&self, filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        Ok(self
            .fetch(filter)?
            .iter()
            .map(|record| Ok(record.id()))
            .collect())
    }
    /// Loads one record regardless of its deletion state.
    fn get(&self, id: RecordId) -> RepoResult<Option<Self::Record>>;
    fn insert(&self, record: &Self::Record) -> RepoResult<RecordId>;
    /// Overwrites an existing record. `NotFound` when the row is gone.
    fn save(&self, record: &Self::Record) -> RepoResult<()>;
    /// Hard-deletes one record. `NotFound` when the row is gone.
    fn delete(&self, id: RecordId) -> RepoResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    type Record = S::Record;

    fn fetch(&self, filter: &RecordFilter) -> RepoResult<Vec<Self::Record>> {
        (**self).fetch(filter)
    }

    fn fetch_ids(&self, filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        (**self).fetch_ids(filter)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Self::Record>> {
        (**self).get(id)
    }

    fn insert(&self, record: &Self::Record) -> RepoResult<RecordId> {
        (**self).insert(record)
    }

    fn save(&self, record: &Self::Record) -> RepoResult<()> {
        (**self).save(record)
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        (**self).delete(id)
    }
}
