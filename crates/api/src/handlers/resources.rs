//! Handlers for the `/resources` resource.
//!
//! Authorization happens in two places: the RBAC extractors gate write
//! endpoints by role, and the resource service checks each resource's
//! allow-list on reads.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lapublica_core::placeholders::ResolvedValues;
use lapublica_core::resource::{NewResource, ResourceUpdate};
use lapublica_core::service::{
    DuplicateRequest, ExtractRequest, PreviewRequest, RecordUsageRequest,
};
use lapublica_core::types::DbId;
use lapublica_core::validation::ValueValidation;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery, OptionalJson};
use crate::middleware::rbac::{RequireAuth, RequireResourceManager};
use crate::query::{ListResourcesParams, PaginationParams};
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for `POST /resources/extract`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractContentRequest {
    pub resource_id: DbId,
    pub lead_id: DbId,
    /// Must match the authenticated user when present.
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub custom_values: ResolvedValues,
    pub context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewContentRequest {
    pub lead_id: Option<DbId>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub custom_values: ResolvedValues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResourceRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateValuesRequest {
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateValuesResponse {
    pub valid: bool,
    pub results: BTreeMap<String, ValueValidation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUsageBody {
    pub lead_id: DbId,
    pub content: String,
    #[serde(default)]
    pub placeholder_values: ResolvedValues,
    pub context: Option<String>,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/resources
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListResourcesParams>,
) -> AppResult<impl IntoResponse> {
    let items = state
        .resources
        .list_resources(&user.actor(), params.into())
        .await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// POST /api/v1/resources
pub async fn create(
    RequireResourceManager(user): RequireResourceManager,
    State(state): State<AppState>,
    AppJson(input): AppJson<NewResource>,
) -> AppResult<impl IntoResponse> {
    let resource = state.resources.create_resource(&user.actor(), input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(resource, "Resource created")),
    ))
}

/// GET /api/v1/resources/{id}
pub async fn get_by_id(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let resource = state.resources.get_resource_by_id(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(resource)))
}

/// GET /api/v1/resources/slug/{slug}
pub async fn get_by_slug(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let resource = state
        .resources
        .get_resource_by_slug(&user.actor(), &slug)
        .await?;
    Ok(Json(ApiResponse::ok(resource)))
}

/// PUT /api/v1/resources/{id}
pub async fn update(
    RequireResourceManager(user): RequireResourceManager,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<ResourceUpdate>,
) -> AppResult<impl IntoResponse> {
    let resource = state
        .resources
        .update_resource(&user.actor(), id, input)
        .await?;
    Ok(Json(ApiResponse::with_message(resource, "Resource updated")))
}

/// DELETE /api/v1/resources/{id}
///
/// Soft delete; the row stays for audit history.
pub async fn delete(
    RequireResourceManager(user): RequireResourceManager,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    state.resources.delete_resource(&user.actor(), id).await?;
    Ok(Json(ApiResponse::with_message(
        json!({ "id": id, "isActive": false }),
        "Resource deactivated",
    )))
}

/// POST /api/v1/resources/{id}/duplicate
pub async fn duplicate(
    RequireResourceManager(user): RequireResourceManager,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    OptionalJson(input): OptionalJson<DuplicateResourceRequest>,
) -> AppResult<impl IntoResponse> {
    let copy = state
        .resources
        .duplicate_resource(
            &user.actor(),
            id,
            DuplicateRequest {
                slug: input.slug,
                title: input.title,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(copy, "Resource duplicated")),
    ))
}

/// GET /api/v1/resources/stats
pub async fn stats(
    RequireResourceManager(user): RequireResourceManager,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stats = state.resources.resource_stats(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

// ---------------------------------------------------------------------------
// Templating
// ---------------------------------------------------------------------------

/// POST /api/v1/resources/extract
///
/// Render a resource for a lead and append a usage record.
pub async fn extract(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppJson(input): AppJson<ExtractContentRequest>,
) -> AppResult<impl IntoResponse> {
    if input.user_id.is_some_and(|id| id != user.user_id) {
        return Err(AppError::BadRequest(
            "userId does not match the authenticated user".into(),
        ));
    }

    let result = state
        .resources
        .extract_content(
            &user.actor(),
            ExtractRequest {
                resource_id: input.resource_id,
                lead_id: input.lead_id,
                user_name: input.user_name,
                custom_values: input.custom_values,
                context: input.context,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/v1/resources/{id}/preview
///
/// Render without recording usage. The lead is optional.
pub async fn preview(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    OptionalJson(input): OptionalJson<PreviewContentRequest>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .resources
        .preview_content(
            &user.actor(),
            id,
            PreviewRequest {
                lead_id: input.lead_id,
                user_name: input.user_name,
                custom_values: input.custom_values,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/v1/resources/{id}/validate-values
pub async fn validate_values(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<ValidateValuesRequest>,
) -> AppResult<impl IntoResponse> {
    let results = state
        .resources
        .validate_values(&user.actor(), id, &input.values)
        .await?;
    let valid = results.values().all(ValueValidation::is_valid);
    Ok(Json(ApiResponse::ok(ValidateValuesResponse { valid, results })))
}

// ---------------------------------------------------------------------------
// Usage history
// ---------------------------------------------------------------------------

/// GET /api/v1/resources/{id}/usages
pub async fn list_usages(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let usages = state
        .resources
        .list_usages(&user.actor(), id, params.limit, params.offset)
        .await?;
    Ok(Json(ApiResponse::ok(usages)))
}

/// POST /api/v1/resources/{id}/usages
pub async fn record_usage(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<RecordUsageBody>,
) -> AppResult<impl IntoResponse> {
    let usage = state
        .resources
        .record_usage(
            &user.actor(),
            id,
            RecordUsageRequest {
                lead_id: input.lead_id,
                content: input.content,
                placeholder_values: input.placeholder_values,
                context: input.context,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(usage, "Usage recorded")),
    ))
}
