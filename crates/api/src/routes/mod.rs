pub mod auth;
pub mod category;
pub mod expense;
pub mod health;
pub mod profile;
pub mod report;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /login                      login (public)
/// /profile                    register (public), get, update
///
/// /categories                 list, create
/// /categories/{id}            update, delete (owner only)
///
/// /expenses                   list (?search=), create
/// /expenses/{id}              get, update name, delete
///
/// /statistics                 spending statistics
/// /csv-export                 CSV download
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/profile", profile::router())
        .nest("/categories", category::router())
        .nest("/expenses", expense::router())
        .merge(report::router())
}
