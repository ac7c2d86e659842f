//! Note use-case service.
//!
//! # Responsibility
//! - Create and edit notes and list them on either side of the trash.
//!
//! # Invariants
//! - Trashed notes are read-only until restored.
//! - This service never changes a note's deletion state.

use crate::clock::{Clock, SystemClock};
use crate::model::deletion::RecordId;
use crate::model::note::Note;
use crate::model::{normalize_title, RecordValidationError};
use crate::repo::{RecordFilter, RecordStore, RepoError, RepoResult, TrashScope};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    Validation(RecordValidationError),
    NoteNotFound(RecordId),
    /// Target note is in the trash and must be restored before editing.
    NoteInTrash(RecordId),
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::NoteInTrash(id) => write!(f, "note is in the trash: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for NoteServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over a note store.
pub struct NoteService<S: RecordStore<Record = Note>, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RecordStore<Record = Note>, C: Clock> NoteService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Creates one active note.
    pub fn create_note(
        &self,
        title: &str,
        content: impl Into<String>,
        category: Option<&str>,
    ) -> Result<Note, NoteServiceError> {
        let note = Note::new(title, content, self.clock.now_ms())?.in_category(category);
        self.store.insert(&note)?;
        info!("event=note_create module=note status=ok id={}", note.id);
        Ok(note)
    }

    /// Replaces title and body of an active note.
    pub fn update_note(
        &self,
        id: RecordId,
        title: &str,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self
            .store
            .get(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))?;
        if note.deletion.is_deleted() {
            return Err(NoteServiceError::NoteInTrash(id));
        }

        note.title = normalize_title(title)?;
        note.content = content.into();
        note.updated_at = self.clock.now_ms().max(note.created_at);
        self.store.save(&note)?;
        Ok(note)
    }

    /// Loads one note on either side of the trash.
    pub fn get_note(&self, id: RecordId) -> RepoResult<Option<Note>> {
        self.store.get(id)
    }

    /// Lists active notes within `scope`.
    pub fn list_notes(&self, scope: &TrashScope) -> RepoResult<Vec<Note>> {
        self.store.fetch(&RecordFilter::active().within(scope))
    }

    /// Lists trashed notes within `scope`, most recently deleted first.
    pub fn list_trash(&self, scope: &TrashScope) -> RepoResult<Vec<Note>> {
        self.store.fetch(&RecordFilter::deleted().within(scope))
    }
}
