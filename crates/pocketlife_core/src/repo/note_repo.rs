//! SQLite record store for notes.
//!
//! # Invariants
//! - Every write validates the note first.
//! - Rows are read back through `parse_note_row`, which rejects
//!   inconsistent soft-delete columns.

use crate::model::deletion::RecordId;
use crate::model::note::Note;
use crate::repo::sqlite::{
    bool_to_int, ensure_table_ready, fetch_ids, parse_deletion, parse_record_id, push_filter,
};
use crate::repo::{RecordFilter, RecordStore, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTES_TABLE: &str = "notes";

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    category,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM notes";

/// SQLite-backed note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, NOTES_TABLE, &["title", "content"])?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteNoteRepository<'_> {
    type Record = Note;

    fn fetch(&self, filter: &RecordFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut binds: Vec<Value> = Vec::new();
        push_filter(&mut sql, &mut binds, filter);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let note = parse_note_row(row)?;
            if filter.matches_category(note.category.as_deref()) {
                notes.push(note);
            }
        }
        Ok(notes)
    }

    fn fetch_ids(&self, filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        fetch_ids(self.conn, NOTES_TABLE, filter)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, note: &Note) -> RepoResult<RecordId> {
        note.validate()?;
        let (is_deleted, deleted_at) = note.deletion.to_columns();

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                title,
                content,
                category,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.category.as_deref(),
                bool_to_int(is_deleted),
                deleted_at,
                note.created_at,
                note.updated_at,
            ],
        )?;

        Ok(note.id)
    }

    fn save(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;
        let (is_deleted, deleted_at) = note.deletion.to_columns();

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                category = ?4,
                is_deleted = ?5,
                deleted_at = ?6,
                updated_at = ?7
             WHERE uuid = ?1;",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.category.as_deref(),
                bool_to_int(is_deleted),
                deleted_at,
                note.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let note = Note {
        id: parse_record_id(row, NOTES_TABLE)?,
        title: row.get("title")?,
        content: row.get("content")?,
        category: row.get("category")?,
        deletion: parse_deletion(row, NOTES_TABLE)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()
        .map_err(|err| RepoError::InvalidData(format!("note {}: {err}", note.id)))?;
    Ok(note)
}
