//! Notes API endpoints
//!
//! Notes are managed under the todo that owns them, they are created and
//! deleted, never updated

use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::notes::Note;
use crate::storage::CreateNoteValues;
use crate::storage::Storage;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::todos::fetch_todo;

/// Note response going to the user
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,

    /// Content of the note
    pub note: String,

    /// ID of the owning todo
    pub todo_id: i64,

    /// Creation date
    pub created_at: DateTime<Utc>,
}

impl NoteResponse {
    /// Create a response from a [`Note`](Note)
    pub(super) fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            note: note.content,
            todo_id: note.todo_id,
            created_at: note.created_at,
        }
    }

    /// Create a response from multiple [`Note`](Note)s
    pub(super) fn from_note_multiple(mut notes: Vec<Note>) -> Vec<Self> {
        notes.drain(..).map(Self::from_note).collect::<Vec<Self>>()
    }
}

/// Create note form
#[derive(Debug, Deserialize)]
pub struct CreateNoteForm {
    /// Content of the note
    note: String,
}

/// Create a note on a todo based on the [`CreateNoteForm`](CreateNoteForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "note": "Pick up milk" }' \
///     http://localhost:3000/todos/1/notes
/// ```
///
/// Response
/// ```json
/// { "id": 1, "note": "Pick up milk", "todo_id": 1, ... }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(todo_id): PathParameters<i64>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let todo = fetch_todo(&storage, todo_id).await?;

    let values = CreateNoteValues {
        content: &form.note,
    };

    let note = storage
        .create_note(&todo, &values)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Delete a note of a todo
///
/// Deleting a note that does not exist, or that belongs to another todo, is
/// not an error: the delete is a no-op and still responds with 204
///
/// Request:
/// ```sh
/// curl -v -XDELETE http://localhost:3000/todos/1/notes/1
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters((todo_id, note_id)): PathParameters<(i64, i64)>,
) -> Result<Success<&'static str>, Error> {
    storage
        .delete_note(todo_id, note_id)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::<&'static str>::no_content())
}
