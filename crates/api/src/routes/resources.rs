//! Route definitions for the `/resources` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::resources;
use crate::state::AppState;

/// Routes mounted at `/resources`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// GET    /stats                   -> stats
/// POST   /extract                 -> extract
/// GET    /slug/{slug}             -> get_by_slug
/// GET    /{id}                    -> get_by_id
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete
/// POST   /{id}/duplicate          -> duplicate
/// POST   /{id}/preview            -> preview
/// POST   /{id}/validate-values    -> validate_values
/// GET    /{id}/usages             -> list_usages
/// POST   /{id}/usages             -> record_usage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(resources::list).post(resources::create))
        .route("/stats", get(resources::stats))
        .route("/extract", post(resources::extract))
        .route("/slug/{slug}", get(resources::get_by_slug))
        .route(
            "/{id}",
            get(resources::get_by_id)
                .put(resources::update)
                .delete(resources::delete),
        )
        .route("/{id}/duplicate", post(resources::duplicate))
        .route("/{id}/preview", post(resources::preview))
        .route("/{id}/validate-values", post(resources::validate_values))
        .route(
            "/{id}/usages",
            get(resources::list_usages).post(resources::record_usage),
        )
}
