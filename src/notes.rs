use chrono::DateTime;
use chrono::Utc;

/// A short annotation attached to exactly one todo
///
/// Notes never outlive their todo, deleting the todo cascades
#[derive(Clone, Debug)]
pub struct Note {
    pub id: i64,
    pub todo_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
