//! Fixture data for demos and tests
//!
//! Optionally populates the storage on startup with a fixed set of todos

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Utc;

use crate::storage::CreateTodoValues;
use crate::storage::Result;
use crate::storage::Storage;

/// Is fixture population requested through the environment?
pub fn requested() -> bool {
    matches!(
        std::env::var("POPULATE_FIXTURES").as_deref(),
        Ok("1" | "true" | "yes")
    )
}

/// Populate the storage with fixture data
///
/// All five todos are inserted in a single transaction, either the full set
/// is stored or nothing is
///
/// # Errors
///
/// Will return `Err` when the storage rejects the insert
pub async fn populate<S: Storage>(storage: &S) -> Result<()> {
    let todos = [
        CreateTodoValues {
            subject: "Buy groceries",
            due_date: None,
            completed: false,
            notes: &[],
        },
        CreateTodoValues {
            subject: "Read a book",
            due_date: None,
            completed: true,
            notes: &[],
        },
        CreateTodoValues {
            subject: "Write some code",
            due_date: None,
            completed: false,
            notes: &[],
        },
        CreateTodoValues {
            subject: "Due tomorrow",
            due_date: Some(parse_date("2023-10-01")),
            completed: false,
            notes: &[],
        },
        CreateTodoValues {
            subject: "Some notes",
            due_date: None,
            completed: false,
            notes: &["Note 1", "Note 2"],
        },
    ];

    storage.create_todos(&todos).await?;

    tracing::info!("Storage populated with fixture data");

    Ok(())
}

/// Parse a `YYYY-MM-DD` fixture date into a midnight UTC timestamp
fn parse_date(date: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .expect("Valid fixture date")
        .and_time(NaiveTime::MIN)
        .and_utc()
}
