//! All things related to the storage of todos and notes

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::notes::Note;
use crate::todos::Todo;

#[cfg(not(feature = "postgres"))]
use memory::Memory;
#[cfg(feature = "postgres")]
use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> Postgres {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input for a record, nothing is written
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a Todo
///
/// Notes are created together with the todo, all rows or none
pub struct CreateTodoValues<'a> {
    /// The subject of the todo
    pub subject: &'a str,

    /// Optional due date, `None` means "no due date"
    pub due_date: Option<DateTime<Utc>>,

    /// The completion flag
    pub completed: bool,

    /// Content of notes to create with the todo
    pub notes: &'a [&'a str],
}

/// Values to update a Todo
///
/// `None` fields are not touched
pub struct UpdateTodoValues<'a> {
    /// New subject of the todo
    pub subject: Option<&'a str>,

    /// New due date of the todo
    ///
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// New completion flag of the todo
    pub completed: Option<bool>,
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// Content of the note
    pub content: &'a str,
}

/// Storage with all supported operations
///
/// Implementations hold no mutable in-process state of their own and are safe
/// for concurrent use, coordination is delegated to the backing store
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find all todos with their notes, in insertion order
    async fn find_all_todos(&self) -> Result<Vec<Todo>>;

    /// Find a single todo by its ID, with its notes
    ///
    /// Signals [`Error::NotFound`] when no todo has that ID
    async fn find_single_todo_by_id(&self, id: i64) -> Result<Todo>;

    /// Create a todo, together with its nested notes
    async fn create_todo(&self, values: &CreateTodoValues<'_>) -> Result<Todo>;

    /// Create multiple todos in a single transaction
    ///
    /// Either all todos (and their notes) are stored, or none
    async fn create_todos(&self, values: &[CreateTodoValues<'_>]) -> Result<Vec<Todo>>;

    /// Update a single todo
    ///
    /// Only subject, due date and completion flag are mutable
    async fn update_todo(&self, todo: &Todo, values: &UpdateTodoValues<'_>) -> Result<Todo>;

    /// Delete a todo, cascading to its notes
    async fn delete_todo(&self, todo: &Todo) -> Result<()>;

    /// Create a note bound to a todo
    async fn create_note(&self, todo: &Todo, values: &CreateNoteValues<'_>) -> Result<Note>;

    /// Delete the note matching both IDs
    ///
    /// Deleting a note that does not exist is not an error
    async fn delete_note(&self, todo_id: i64, note_id: i64) -> Result<()>;
}

/// Validate the subject of a todo
fn validate_subject(subject: &str) -> Result<()> {
    if subject.trim().is_empty() {
        Err(Error::Validation(String::from("Subject can not be empty")))
    } else {
        Ok(())
    }
}

/// Validate the content of a note
fn validate_note_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        Err(Error::Validation(String::from("Note can not be empty")))
    } else {
        Ok(())
    }
}

/// Validate a full set of todos before any row is written
fn validate_create_values(values: &[CreateTodoValues<'_>]) -> Result<()> {
    for value in values {
        validate_subject(value.subject)?;

        for content in value.notes {
            validate_note_content(content)?;
        }
    }

    Ok(())
}
