//! Route definitions for read-only reports.

use axum::routing::get;
use axum::Router;

use crate::handlers::{export, statistics};
use crate::state::AppState;

/// ```text
/// GET /statistics  -> statistics::get
/// GET /csv-export  -> export::csv_export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(statistics::get))
        .route("/csv-export", get(export::csv_export))
}
