//! Shared query parameter types for API handlers.

use lapublica_core::resource::{ResourceCategory, ResourcePhase, ResourceType};
use lapublica_core::service::ResourceQuery;
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the service layer via `clamp_limit` / `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `GET /resources` filters.
///
/// `?type=SPEECH&phase=PROPOSAL&category=SALES&tag=..&search=..&includeInactive=true`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesParams {
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    pub phase: Option<ResourcePhase>,
    pub category: Option<ResourceCategory>,
    pub tag: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListResourcesParams> for ResourceQuery {
    fn from(params: ListResourcesParams) -> Self {
        ResourceQuery {
            resource_type: params.resource_type,
            phase: params.phase,
            category: params.category,
            tag: params.tag,
            search: params.search,
            include_inactive: params.include_inactive,
            limit: params.limit,
            offset: params.offset,
        }
    }
}
