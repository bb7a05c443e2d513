//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod projects;
pub mod upload;
pub mod users;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(projects::routes())
        .merge(upload::routes())
}
