//! Resource usage model.

use lapublica_core::placeholders::ResolvedValues;
use lapublica_core::types::{DbId, Timestamp};
use lapublica_core::usage::ResourceUsage;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `resource_usages` table.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceUsageRow {
    pub id: DbId,
    pub resource_id: DbId,
    pub lead_id: DbId,
    pub user_id: DbId,
    pub content: String,
    pub placeholder_values: Json<ResolvedValues>,
    pub context: Option<String>,
    pub created_at: Timestamp,
}

impl From<ResourceUsageRow> for ResourceUsage {
    fn from(row: ResourceUsageRow) -> Self {
        ResourceUsage {
            id: row.id,
            resource_id: row.resource_id,
            lead_id: row.lead_id,
            user_id: row.user_id,
            content: row.content,
            placeholder_values: row.placeholder_values.0,
            context: row.context,
            created_at: row.created_at,
        }
    }
}
