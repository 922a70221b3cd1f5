use chrono::DateTime;
use chrono::Utc;

use crate::notes::Note;

/// A task with a subject, an optional due date and a completion flag
///
/// Owns zero or more [`Note`]s, kept in insertion order
#[derive(Clone, Debug)]
pub struct Todo {
    pub id: i64,
    pub subject: String,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub notes: Vec<Note>,
}
