//! Todos API endpoints
//!
//! Everything related to the todos management

use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::storage::CreateTodoValues;
use crate::storage::Storage;
use crate::storage::UpdateTodoValues;
use crate::todos::Todo;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;
use super::notes::NoteResponse;
use super::request::double_option;

/// Todo response going to the user
///
/// Basically filtering which fields are shown to the user
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    /// Todo ID
    pub id: i64,

    /// Subject of the todo
    pub subject: String,

    /// Optional due date, absent when there is none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Completion flag
    pub completed: bool,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Notes of the todo, in insertion order
    pub notes: Vec<NoteResponse>,
}

impl TodoResponse {
    /// Create a response from a [`Todo`](Todo)
    fn from_todo(todo: Todo) -> Self {
        Self {
            id: todo.id,
            subject: todo.subject,
            due_date: todo.due_date,
            completed: todo.completed,
            created_at: todo.created_at,
            notes: NoteResponse::from_note_multiple(todo.notes),
        }
    }

    /// Create a response from multiple [`Todo`](Todo)s
    fn from_todo_multiple(mut todos: Vec<Todo>) -> Vec<Self> {
        todos.drain(..).map(Self::from_todo).collect::<Vec<Self>>()
    }
}

/// List all todos, with their notes
///
/// Request:
/// ```sh
/// curl -v http://localhost:3000/todos
/// ```
///
/// Response:
/// ```json
/// [ { "id": 1, "subject": "Buy groceries", "completed": false, "notes": [] } ]
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
) -> Result<Success<Vec<TodoResponse>>, Error> {
    let todos = storage
        .find_all_todos()
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::ok(TodoResponse::from_todo_multiple(todos)))
}

/// Get a single todo
///
/// Request:
/// ```sh
/// curl -v http://localhost:3000/todos/1
/// ```
///
/// Response:
/// ```json
/// { "id": 1, "subject": "Buy groceries", "completed": false, "notes": [] }
/// ```
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(todo_id): PathParameters<i64>,
) -> Result<Success<TodoResponse>, Error> {
    fetch_todo(&storage, todo_id)
        .await
        .map(|todo| Success::ok(TodoResponse::from_todo(todo)))
}

/// Nested note of the create todo form
#[derive(Debug, Deserialize)]
pub struct CreateTodoNoteForm {
    /// Content of the note
    note: String,
}

/// Create todo form
///
/// Fields to create a todo with, nested notes are created atomically with the
/// todo itself
#[derive(Debug, Deserialize)]
pub struct CreateTodoForm {
    /// Subject to create a todo with
    subject: String,

    /// Optional due date
    due_date: Option<DateTime<Utc>>,

    /// Completion flag, defaults to `false`
    completed: Option<bool>,

    /// Notes to create together with the todo
    notes: Option<Vec<CreateTodoNoteForm>>,
}

/// Create a todo based on the [`CreateTodoForm`](CreateTodoForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "subject": "Buy groceries", "due_date": "2023-12-31T00:00:00Z" }' \
///     http://localhost:3000/todos
/// ```
///
/// Response
/// ```json
/// { "id": 1, "subject": "Buy groceries", "due_date": "2023-12-31T00:00:00Z", ... }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    Form(form): Form<CreateTodoForm>,
) -> Result<Success<TodoResponse>, Error> {
    let notes = form
        .notes
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|note| note.note.as_str())
        .collect::<Vec<&str>>();

    let values = CreateTodoValues {
        subject: &form.subject,
        due_date: form.due_date,
        completed: form.completed.unwrap_or(false),
        notes: &notes,
    };

    let todo = storage
        .create_todo(&values)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::created(TodoResponse::from_todo(todo)))
}

/// Update todo form
///
/// Fields to update a todo with, all fields are optional and are not touched
/// when not provided
///
/// The due date makes a three-way distinction: omitting the field keeps the
/// current value, an explicit `null` clears it, a value sets it
#[derive(Debug, Deserialize)]
pub struct UpdateTodoForm {
    /// New subject of the todo
    subject: Option<String>,

    /// New due date of the todo
    #[serde(default, deserialize_with = "double_option")]
    due_date: Option<Option<DateTime<Utc>>>,

    /// New completion flag of the todo
    completed: Option<bool>,
}

/// Update a todo based on the [`UpdateTodoForm`](UpdateTodoForm) form
///
/// Only provided values are processed, the other fields of the todo will not
/// be touched
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -d '{ "completed": true }' \
///     http://localhost:3000/todos/1
/// ```
///
/// Response
/// ```json
/// { "id": 1, "subject": "Buy groceries", "completed": true, ... }
/// ```
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(todo_id): PathParameters<i64>,
    Form(form): Form<UpdateTodoForm>,
) -> Result<Success<TodoResponse>, Error> {
    let todo = fetch_todo(&storage, todo_id).await?;

    let values = UpdateTodoValues {
        subject: form.subject.as_deref(),
        due_date: form.due_date,
        completed: form.completed,
    };

    let updated_todo = storage
        .update_todo(&todo, &values)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::ok(TodoResponse::from_todo(updated_todo)))
}

/// Delete a todo
///
/// Deletes cascade to the notes of the todo
///
/// Request:
/// ```sh
/// curl -v -XDELETE http://localhost:3000/todos/1
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    PathParameters(todo_id): PathParameters<i64>,
) -> Result<Success<&'static str>, Error> {
    let todo = fetch_todo(&storage, todo_id).await?;

    storage
        .delete_todo(&todo)
        .await
        .map_err(Error::from_storage)?;

    Ok(Success::<&'static str>::no_content())
}

/// Fetch a todo from storage
pub(super) async fn fetch_todo<S: Storage>(storage: &S, todo_id: i64) -> Result<Todo, Error> {
    storage
        .find_single_todo_by_id(todo_id)
        .await
        .map_err(Error::from_storage)
}
