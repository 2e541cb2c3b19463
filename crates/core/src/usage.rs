//! Resource usage audit records. Append-only.

use serde::Serialize;

use crate::placeholders::ResolvedValues;
use crate::types::{DbId, Timestamp};

/// One substitution event: which resource was rendered for which lead, by
/// whom, and the exact text produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub id: DbId,
    pub resource_id: DbId,
    pub lead_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub placeholder_values: ResolvedValues,
    pub context: Option<String>,
    pub created_at: Timestamp,
}

/// Insert payload for a [`ResourceUsage`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewResourceUsage {
    pub resource_id: DbId,
    pub lead_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub placeholder_values: ResolvedValues,
    pub context: Option<String>,
}
