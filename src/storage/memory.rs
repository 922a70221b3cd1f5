//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::notes::Note;
use crate::todos::Todo;

use super::CreateNoteValues;
use super::CreateTodoValues;
use super::Error;
use super::Result;
use super::Storage;
use super::UpdateTodoValues;
use super::validate_create_values;
use super::validate_note_content;
use super::validate_subject;

/// All records behind a single lock
///
/// A single lock makes the multi-row writes atomic, mirroring the transaction
/// of the Postgres storage
#[derive(Debug, Default)]
struct Records {
    /// All todos in storage, without their notes
    todos: HashMap<i64, Todo>,

    /// All notes in storage
    notes: HashMap<i64, Note>,

    /// Next todo ID, IDs are never reused
    next_todo_id: i64,

    /// Next note ID, IDs are never reused
    next_note_id: i64,
}

impl Records {
    /// Clone a todo with its notes attached, in insertion order
    fn todo_with_notes(&self, todo: &Todo) -> Todo {
        let mut notes = self
            .notes
            .values()
            .filter(|note| note.todo_id == todo.id)
            .cloned()
            .collect::<Vec<Note>>();
        notes.sort_by_key(|note| note.id);

        let mut todo = todo.clone();
        todo.notes = notes;

        todo
    }

    fn insert_todo(&mut self, values: &CreateTodoValues<'_>) -> Todo {
        self.next_todo_id += 1;

        let todo = Todo {
            id: self.next_todo_id,
            subject: values.subject.to_string(),
            due_date: values.due_date,
            completed: values.completed,
            created_at: Utc::now(),
            notes: Vec::new(),
        };

        self.todos.insert(todo.id, todo.clone());

        for content in values.notes {
            self.insert_note(todo.id, content);
        }

        self.todo_with_notes(&todo)
    }

    fn insert_note(&mut self, todo_id: i64, content: &str) -> Note {
        self.next_note_id += 1;

        let note = Note {
            id: self.next_note_id,
            todo_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        self.notes.insert(note.id, note.clone());

        note
    }
}

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All records in storage
    records: Arc<Mutex<Records>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Records::default())),
        }
    }
}

#[async_trait]
impl Storage for Memory {
    async fn find_all_todos(&self) -> Result<Vec<Todo>> {
        let records = self.records.lock().await;

        let mut todos = records
            .todos
            .values()
            .map(|todo| records.todo_with_notes(todo))
            .collect::<Vec<Todo>>();
        todos.sort_by_key(|todo| todo.id);

        Ok(todos)
    }

    async fn find_single_todo_by_id(&self, id: i64) -> Result<Todo> {
        let records = self.records.lock().await;

        records
            .todos
            .get(&id)
            .map(|todo| records.todo_with_notes(todo))
            .ok_or(Error::NotFound("Todo"))
    }

    async fn create_todo(&self, values: &CreateTodoValues<'_>) -> Result<Todo> {
        validate_subject(values.subject)?;

        for content in values.notes {
            validate_note_content(content)?;
        }

        Ok(self.records.lock().await.insert_todo(values))
    }

    async fn create_todos(&self, values: &[CreateTodoValues<'_>]) -> Result<Vec<Todo>> {
        validate_create_values(values)?;

        let mut records = self.records.lock().await;

        Ok(values
            .iter()
            .map(|value| records.insert_todo(value))
            .collect())
    }

    async fn update_todo(&self, todo: &Todo, values: &UpdateTodoValues<'_>) -> Result<Todo> {
        if let Some(subject) = values.subject {
            validate_subject(subject)?;
        }

        let mut records = self.records.lock().await;

        let stored = records
            .todos
            .get_mut(&todo.id)
            .ok_or(Error::NotFound("Todo"))?;

        if let Some(subject) = values.subject {
            stored.subject = subject.to_string();
        }

        if let Some(due_date) = values.due_date {
            stored.due_date = due_date;
        }

        if let Some(completed) = values.completed {
            stored.completed = completed;
        }

        let updated = stored.clone();

        Ok(records.todo_with_notes(&updated))
    }

    async fn delete_todo(&self, todo: &Todo) -> Result<()> {
        let mut records = self.records.lock().await;

        records.todos.remove(&todo.id);

        // cascade to the notes of the todo
        records.notes.retain(|_, note| note.todo_id != todo.id);

        Ok(())
    }

    async fn create_note(&self, todo: &Todo, values: &CreateNoteValues<'_>) -> Result<Note> {
        validate_note_content(values.content)?;

        let mut records = self.records.lock().await;

        if !records.todos.contains_key(&todo.id) {
            return Err(Error::NotFound("Todo"));
        }

        Ok(records.insert_note(todo.id, values.content))
    }

    async fn delete_note(&self, todo_id: i64, note_id: i64) -> Result<()> {
        let mut records = self.records.lock().await;

        // deleting a note that does not exist is not an error
        records
            .notes
            .retain(|_, note| !(note.id == note_id && note.todo_id == todo_id));

        Ok(())
    }
}
