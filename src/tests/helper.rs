use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;

use crate::setup_app;

/// Test helper version of Todo struct
#[derive(Debug, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub subject: String,
    pub due_date: Option<String>,
    pub completed: bool,
    pub notes: Vec<Note>,
}

/// Test helper version of Note struct
#[derive(Debug, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub note: String,
    pub todo_id: i64,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub description: Option<String>,
}

/// Setup the Toodle app with an empty storage
pub async fn setup_test_app() -> Router {
    setup_app(false).await.unwrap()
}

/// Setup the Toodle app, populated with the fixture todos
pub async fn setup_test_app_with_fixtures() -> Router {
    setup_app(true).await.unwrap()
}

pub async fn list_todos(app: &mut Router) -> (StatusCode, Option<Vec<Todo>>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/todos")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_todos(&body))
        } else {
            None
        },
    )
}

pub async fn single_todo(app: &mut Router, id: i64) -> (StatusCode, Option<Todo>, Option<String>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/todos/{id}"))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_todo(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_todo_with_payload(
    app: &mut Router,
    payload: Value,
) -> (StatusCode, Option<Todo>, Option<String>) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/todos")
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_todo(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_todo(
    app: &mut Router,
    subject: &str,
) -> (StatusCode, Option<Todo>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("subject".to_string(), Value::String(subject.to_string()));

    maybe_create_todo_with_payload(app, Value::Object(payload)).await
}

pub async fn maybe_create_todo_with_due_date(
    app: &mut Router,
    subject: &str,
    due_date: &str,
) -> (StatusCode, Option<Todo>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("subject".to_string(), Value::String(subject.to_string()));
    payload.insert("due_date".to_string(), Value::String(due_date.to_string()));

    maybe_create_todo_with_payload(app, Value::Object(payload)).await
}

pub async fn maybe_create_todo_with_notes(
    app: &mut Router,
    subject: &str,
    notes: &[&str],
) -> (StatusCode, Option<Todo>, Option<String>) {
    let notes = notes
        .iter()
        .map(|note| {
            let mut payload = Map::new();
            payload.insert("note".to_string(), Value::String((*note).to_string()));
            Value::Object(payload)
        })
        .collect::<Vec<Value>>();

    let mut payload = Map::new();
    payload.insert("subject".to_string(), Value::String(subject.to_string()));
    payload.insert("notes".to_string(), Value::Array(notes));

    maybe_create_todo_with_payload(app, Value::Object(payload)).await
}

pub async fn maybe_create_todo_with_raw_body(
    app: &mut Router,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Option<Todo>, Option<Error>) {
    let mut builder = Request::builder().method(Method::POST).uri("/todos");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder.body(Body::from(body.as_bytes())).unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_todo(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST {
            Some(get_error(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_update_todo(
    app: &mut Router,
    todo_id: i64,
    payload: Value,
) -> (StatusCode, Option<Todo>, Option<String>) {
    let request = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/todos/{todo_id}"))
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_todo(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_delete_todo(app: &mut Router, id: i64) -> (StatusCode, Option<String>) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/todos/{id}"))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_create_note(
    app: &mut Router,
    todo_id: i64,
    note: &str,
) -> (StatusCode, Option<Note>, Option<String>) {
    maybe_create_note_with_str(app, &todo_id.to_string(), note).await
}

pub async fn maybe_create_note_with_str(
    app: &mut Router,
    todo_id: &str,
    note: &str,
) -> (StatusCode, Option<Note>, Option<String>) {
    let mut payload = Map::new();
    payload.insert("note".to_string(), Value::String(note.to_string()));

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/todos/{todo_id}/notes"))
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_note(&body))
        } else {
            None
        },
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn maybe_delete_note(
    app: &mut Router,
    todo_id: i64,
    note_id: i64,
) -> (StatusCode, Option<String>) {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/todos/{todo_id}/notes/{note_id}"))
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (
        status_code,
        if status_code == StatusCode::BAD_REQUEST || status_code == StatusCode::NOT_FOUND {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

fn value_to_todo(todo: &Map<String, Value>) -> Todo {
    Todo {
        id: todo["id"].as_i64().unwrap(),
        subject: todo["subject"].as_str().map(ToString::to_string).unwrap(),
        due_date: todo
            .get("due_date")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        completed: todo["completed"].as_bool().unwrap(),
        notes: todo["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|note| note.as_object().unwrap())
            .map(value_to_note)
            .collect(),
    }
}

fn get_todo(body: &Bytes) -> Todo {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_todo)
        .unwrap()
}

fn get_todos(body: &Bytes) -> Vec<Todo> {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| todo.as_object().unwrap())
        .map(value_to_todo)
        .collect()
}

fn value_to_note(note: &Map<String, Value>) -> Note {
    Note {
        id: note["id"].as_i64().unwrap(),
        note: note["note"].as_str().map(ToString::to_string).unwrap(),
        todo_id: note["todo_id"].as_i64().unwrap(),
    }
}

fn get_note(body: &Bytes) -> Note {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_note)
        .unwrap()
}

fn get_error(body: &Bytes) -> Error {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(|error| Error {
            error: error["error"].as_str().map(ToString::to_string).unwrap(),
            description: error
                .get("description")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        })
        .unwrap()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}
