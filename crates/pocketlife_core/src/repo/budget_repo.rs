//! SQLite record store for budget items.

use crate::model::budget::{BudgetItem, EntryKind};
use crate::model::deletion::RecordId;
use crate::repo::sqlite::{
    bool_to_int, ensure_table_ready, fetch_ids, parse_deletion, parse_record_id, push_filter,
};
use crate::repo::{RecordFilter, RecordStore, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const BUDGET_TABLE: &str = "budget_items";

const BUDGET_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    amount_cents,
    entry_kind,
    category,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM budget_items";

/// SQLite-backed budget item store.
pub struct SqliteBudgetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBudgetRepository<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, BUDGET_TABLE, &["title", "amount_cents", "entry_kind"])?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteBudgetRepository<'_> {
    type Record = BudgetItem;

    fn fetch(&self, filter: &RecordFilter) -> RepoResult<Vec<BudgetItem>> {
        let mut sql = format!("{BUDGET_SELECT_SQL} WHERE 1 = 1");
        let mut binds: Vec<Value> = Vec::new();
        push_filter(&mut sql, &mut binds, filter);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let item = parse_budget_row(row)?;
            if filter.matches_category(item.category.as_deref()) {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn fetch_ids(&self, filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        fetch_ids(self.conn, BUDGET_TABLE, filter)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<BudgetItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BUDGET_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_budget_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, item: &BudgetItem) -> RepoResult<RecordId> {
        item.validate()?;
        let (is_deleted, deleted_at) = item.deletion.to_columns();

        self.conn.execute(
            "INSERT INTO budget_items (
                uuid,
                title,
                amount_cents,
                entry_kind,
                category,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                item.id.to_string(),
                item.title.as_str(),
                item.amount_cents,
                item.kind.as_str(),
                item.category.as_deref(),
                bool_to_int(is_deleted),
                deleted_at,
                item.created_at,
                item.updated_at,
            ],
        )?;

        Ok(item.id)
    }

    fn save(&self, item: &BudgetItem) -> RepoResult<()> {
        item.validate()?;
        let (is_deleted, deleted_at) = item.deletion.to_columns();

        let changed = self.conn.execute(
            "UPDATE budget_items
             SET
                title = ?2,
                amount_cents = ?3,
                entry_kind = ?4,
                category = ?5,
                is_deleted = ?6,
                deleted_at = ?7,
                updated_at = ?8
             WHERE uuid = ?1;",
            params![
                item.id.to_string(),
                item.title.as_str(),
                item.amount_cents,
                item.kind.as_str(),
                item.category.as_deref(),
                bool_to_int(is_deleted),
                deleted_at,
                item.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(item.id));
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM budget_items WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_budget_row(row: &Row<'_>) -> RepoResult<BudgetItem> {
    let kind_text: String = row.get("entry_kind")?;
    let kind = EntryKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid entry kind `{kind_text}` in budget_items.entry_kind"
        ))
    })?;

    let item = BudgetItem {
        id: parse_record_id(row, BUDGET_TABLE)?,
        title: row.get("title")?,
        amount_cents: row.get("amount_cents")?,
        kind,
        category: row.get("category")?,
        deletion: parse_deletion(row, BUDGET_TABLE)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    item.validate()
        .map_err(|err| RepoError::InvalidData(format!("budget item {}: {err}", item.id)))?;
    Ok(item)
}
