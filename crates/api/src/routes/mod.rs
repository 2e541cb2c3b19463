pub mod health;
pub mod resources;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /resources                        list, create
/// /resources/stats                  aggregate counts (resource managers)
/// /resources/extract                render for a lead + audit
/// /resources/slug/{slug}            fetch by slug
/// /resources/{id}                   get, update, soft delete
/// /resources/{id}/duplicate         copy under a fresh slug
/// /resources/{id}/preview           render without audit
/// /resources/{id}/validate-values   check caller values
/// /resources/{id}/usages            audit history, record usage
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/resources", resources::router())
}
