//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;

pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod notes;
mod request;
mod response;
mod todos;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let notes = Router::new()
        .route("/", post(notes::create::<S>))
        .route("/{note}", delete(notes::delete::<S>));

    Router::new()
        .route("/todos", get(todos::list::<S>))
        .route("/todos", post(todos::create::<S>))
        .route("/todos/{todo}", get(todos::single::<S>))
        .route("/todos/{todo}", patch(todos::update::<S>))
        .route("/todos/{todo}", delete(todos::delete::<S>))
        .nest("/todos/{todo}/notes", notes)
}
