//! SQL helpers shared by the SQLite record stores.

use crate::db::migrations::{current_version, latest_version};
use crate::model::deletion::{DeletionState, RecordId};
use crate::repo::{DeletionFilter, RecordFilter, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use uuid::Uuid;

/// Columns every deletable table carries.
pub(crate) const LIFECYCLE_COLUMNS: &[&str] = &[
    "uuid",
    "category",
    "is_deleted",
    "deleted_at",
    "created_at",
    "updated_at",
];

/// Verifies the connection is migrated and `table` has the expected shape.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    payload_columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let columns = table_columns(conn, table)?;
    for &column in LIFECYCLE_COLUMNS.iter().chain(payload_columns) {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

/// Appends `WHERE`-clause fragments and an `ORDER BY` for `filter`.
///
/// `sql` must already end with a `WHERE` clause (`WHERE 1 = 1` is fine).
/// The category clause is left to `RecordFilter::matches_category`.
pub(crate) fn push_filter(sql: &mut String, binds: &mut Vec<Value>, filter: &RecordFilter) {
    match filter.state {
        DeletionFilter::Active => sql.push_str(" AND is_deleted = 0"),
        DeletionFilter::Deleted => sql.push_str(" AND is_deleted = 1"),
        DeletionFilter::Any => {}
    }

    if let Some(cutoff) = filter.deleted_before {
        sql.push_str(" AND deleted_at IS NOT NULL AND deleted_at < ?");
        binds.push(Value::Integer(cutoff));
    }

    if filter.state == DeletionFilter::Deleted {
        sql.push_str(" ORDER BY deleted_at DESC, uuid ASC");
    } else {
        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
    }
}

/// Reads only `uuid` (and `category` when scoped) for matching rows.
pub(crate) fn fetch_ids(
    conn: &Connection,
    table: &'static str,
    filter: &RecordFilter,
) -> RepoResult<Vec<RepoResult<RecordId>>> {
    let mut sql = format!("SELECT uuid, category FROM {table} WHERE 1 = 1");
    let mut binds: Vec<Value> = Vec::new();
    push_filter(&mut sql, &mut binds, filter);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        if filter.category.is_some() {
            match row.get::<_, Option<String>>("category") {
                Ok(category) if !filter.matches_category(category.as_deref()) => continue,
                Ok(_) => {}
                Err(err) => {
                    ids.push(Err(err.into()));
                    continue;
                }
            }
        }
        ids.push(parse_record_id(row, table));
    }
    Ok(ids)
}

pub(crate) fn parse_record_id(row: &Row<'_>, table: &str) -> RepoResult<RecordId> {
    let uuid_text: String = row.get("uuid")?;
    Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in {table}.uuid"))
    })
}

pub(crate) fn parse_deletion(row: &Row<'_>, table: &str) -> RepoResult<DeletionState> {
    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in {table}.is_deleted"
            )));
        }
    };
    let deleted_at: Option<i64> = row.get("deleted_at")?;

    DeletionState::from_columns(is_deleted, deleted_at).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "inconsistent soft-delete columns in {table}: is_deleted={is_deleted} deleted_at={deleted_at:?}"
        ))
    })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
