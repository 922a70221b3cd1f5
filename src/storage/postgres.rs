//! Postgres storage

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Postgres as PostgresDriver;
use sqlx::Transaction;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::postgres::PgSslMode;

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

/// Migrator to run the schema migrations on startup
///
/// The migrations are an explicit, ordered list of table definitions, applied
/// idempotently
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Uses the `DATABASE_URL` environment variable, or the separate
    /// `POSTGRES_*` variables when it is not set
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let connect_options = if let Ok(url) = std::env::var("DATABASE_URL") {
            url.parse::<PgConnectOptions>().expect("Valid DATABASE_URL")
        } else {
            connect_options_from_environment()
        };

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(connect_options)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

/// Build connection options from the separate `POSTGRES_*` variables
fn connect_options_from_environment() -> PgConnectOptions {
    use std::env::var;

    let mut options = PgConnectOptions::new();

    if let Ok(host) = var("POSTGRES_HOSTNAME") {
        options = options.host(&host);
    }

    if let Ok(port) = var("POSTGRES_PORT") {
        options = options.port(port.parse::<u16>().expect("Valid POSTGRES_PORT"));
    }

    if let Ok(username) = var("POSTGRES_USER") {
        options = options.username(&username);
    }

    if let Ok(password) = var("POSTGRES_PASSWORD") {
        options = options.password(&password);
    }

    if let Ok(database) = var("POSTGRES_DB") {
        options = options.database(&database);
    }

    if let Ok(ssl_mode) = var("POSTGRES_SSLMODE") {
        options = options.ssl_mode(
            ssl_mode
                .parse::<PgSslMode>()
                .expect("Valid POSTGRES_SSLMODE"),
        );
    }

    if let Ok(timezone) = var("POSTGRES_TIMEZONE") {
        options = options.options([("TimeZone", timezone.as_str())]);
    }

    options
}

/// Postgres row of a todo, without its notes
#[derive(sqlx::FromRow)]
struct SqlxTodo {
    /// Todo ID
    id: i64,

    /// Subject
    subject: String,

    /// Optional due date
    due_date: Option<DateTime<Utc>>,

    /// Completion flag
    completed: bool,

    /// Creation date
    created_at: DateTime<Utc>,
}

/// Postgres row of a note
#[derive(sqlx::FromRow)]
struct SqlxNote {
    /// Note ID
    id: i64,

    /// ID of the owning todo
    todo_id: i64,

    /// Content
    content: String,

    /// Creation date
    created_at: DateTime<Utc>,
}

impl Todo {
    /// Create a todo from its postgres row and its notes
    fn from_sqlx_todo(todo: SqlxTodo, notes: Vec<Note>) -> Self {
        Self {
            id: todo.id,
            subject: todo.subject,
            due_date: todo.due_date,
            completed: todo.completed,
            created_at: todo.created_at,
            notes,
        }
    }
}

impl Note {
    /// Create a note from its postgres row
    fn from_sqlx_note(note: SqlxNote) -> Self {
        Self {
            id: note.id,
            todo_id: note.todo_id,
            content: note.content,
            created_at: note.created_at,
        }
    }

    /// Create multiple notes from their postgres rows
    fn from_sqlx_note_multiple(mut notes: Vec<SqlxNote>) -> Vec<Self> {
        notes
            .drain(..)
            .map(Self::from_sqlx_note)
            .collect::<Vec<Self>>()
    }
}

/// Insert a todo with its notes inside an open transaction
async fn insert_todo(
    transaction: &mut Transaction<'_, PostgresDriver>,
    values: &CreateTodoValues<'_>,
) -> Result<Todo> {
    let todo = sqlx::query_as::<_, SqlxTodo>(
        r"
        INSERT INTO todos (subject, due_date, completed)
        VALUES ($1, $2, $3)
        RETURNING id, subject, due_date, completed, created_at
        ",
    )
    .bind(values.subject)
    .bind(values.due_date)
    .bind(values.completed)
    .fetch_one(&mut **transaction)
    .await
    .map_err(connection_error)?;

    let mut notes = Vec::with_capacity(values.notes.len());

    for content in values.notes {
        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            INSERT INTO notes (todo_id, content)
            VALUES ($1, $2)
            RETURNING id, todo_id, content, created_at
            ",
        )
        .bind(todo.id)
        .bind(content)
        .fetch_one(&mut **transaction)
        .await
        .map_err(connection_error)?;

        notes.push(Note::from_sqlx_note(note));
    }

    Ok(Todo::from_sqlx_todo(todo, notes))
}

#[async_trait]
impl Storage for Postgres {
    async fn find_all_todos(&self) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, SqlxTodo>(
            r"
            SELECT id, subject, due_date, completed, created_at
            FROM todos
            ORDER BY id
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        if todos.is_empty() {
            return Ok(Vec::new());
        }

        let notes = sqlx::query_as::<_, SqlxNote>(
            r"
            SELECT id, todo_id, content, created_at
            FROM notes
            WHERE todo_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(todos.iter().map(|todo| todo.id).collect::<Vec<i64>>())
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let mut notes_by_todo: HashMap<i64, Vec<Note>> = HashMap::new();
        for note in Note::from_sqlx_note_multiple(notes) {
            notes_by_todo.entry(note.todo_id).or_default().push(note);
        }

        Ok(todos
            .into_iter()
            .map(|todo| {
                let notes = notes_by_todo.remove(&todo.id).unwrap_or_default();
                Todo::from_sqlx_todo(todo, notes)
            })
            .collect())
    }

    async fn find_single_todo_by_id(&self, id: i64) -> Result<Todo> {
        let todo = sqlx::query_as::<_, SqlxTodo>(
            r"
            SELECT id, subject, due_date, completed, created_at
            FROM todos
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?
        .ok_or(Error::NotFound("Todo"))?;

        let notes = sqlx::query_as::<_, SqlxNote>(
            r"
            SELECT id, todo_id, content, created_at
            FROM notes
            WHERE todo_id = $1
            ORDER BY id
            ",
        )
        .bind(todo.id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(Todo::from_sqlx_todo(
            todo,
            Note::from_sqlx_note_multiple(notes),
        ))
    }

    async fn create_todo(&self, values: &CreateTodoValues<'_>) -> Result<Todo> {
        validate_subject(values.subject)?;

        for content in values.notes {
            validate_note_content(content)?;
        }

        let mut transaction = self.connection_pool.begin().await.map_err(connection_error)?;

        let todo = insert_todo(&mut transaction, values).await?;

        transaction.commit().await.map_err(connection_error)?;

        Ok(todo)
    }

    async fn create_todos(&self, values: &[CreateTodoValues<'_>]) -> Result<Vec<Todo>> {
        validate_create_values(values)?;

        let mut transaction = self.connection_pool.begin().await.map_err(connection_error)?;

        let mut todos = Vec::with_capacity(values.len());

        for value in values {
            todos.push(insert_todo(&mut transaction, value).await?);
        }

        transaction.commit().await.map_err(connection_error)?;

        Ok(todos)
    }

    async fn update_todo(&self, todo: &Todo, values: &UpdateTodoValues<'_>) -> Result<Todo> {
        if let Some(subject) = values.subject {
            validate_subject(subject)?;
        }

        let updated_todo = sqlx::query_as::<_, SqlxTodo>(
            r"
            UPDATE todos
            SET subject = $1, due_date = $2, completed = $3
            WHERE id = $4
            RETURNING id, subject, due_date, completed, created_at
            ",
        )
        .bind(values.subject.unwrap_or(&todo.subject))
        .bind(values.due_date.unwrap_or(todo.due_date))
        .bind(values.completed.unwrap_or(todo.completed))
        .bind(todo.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?
        .ok_or(Error::NotFound("Todo"))?;

        Ok(Todo::from_sqlx_todo(updated_todo, todo.notes.clone()))
    }

    async fn delete_todo(&self, todo: &Todo) -> Result<()> {
        // notes cascade through the foreign key constraint
        let result = sqlx::query(
            r"
            DELETE FROM todos
            WHERE id = $1
            ",
        )
        .bind(todo.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Todo"));
        }

        Ok(())
    }

    async fn create_note(&self, todo: &Todo, values: &CreateNoteValues<'_>) -> Result<Note> {
        validate_note_content(values.content)?;

        let note = sqlx::query_as::<_, SqlxNote>(
            r"
            INSERT INTO notes (todo_id, content)
            VALUES ($1, $2)
            RETURNING id, todo_id, content, created_at
            ",
        )
        .bind(todo.id)
        .bind(values.content)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(Note::from_sqlx_note(note))
    }

    async fn delete_note(&self, todo_id: i64, note_id: i64) -> Result<()> {
        // deleting a note that does not exist is not an error
        sqlx::query(
            r"
            DELETE FROM notes
            WHERE todo_id = $1 AND id = $2
            ",
        )
        .bind(todo_id)
        .bind(note_id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
