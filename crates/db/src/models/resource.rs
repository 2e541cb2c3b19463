//! Commercial resource model.

use lapublica_core::error::CoreError;
use lapublica_core::resource::{
    CommercialResource, Placeholder, ResourceCategory, ResourceContent, ResourcePhase,
    ResourceType,
};
use lapublica_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `commercial_resources` table.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub phase: String,
    pub category: String,
    pub content: Json<ResourceContent>,
    pub placeholders: Json<Vec<Placeholder>>,
    pub tags: Vec<String>,
    pub access_roles: Vec<String>,
    pub is_active: bool,
    pub version: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn corrupt(id: DbId, err: CoreError) -> CoreError {
    CoreError::Internal(format!("commercial_resources row {id} is invalid: {err}"))
}

impl TryFrom<ResourceRow> for CommercialResource {
    type Error = CoreError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let resource_type: ResourceType = row.resource_type.parse().map_err(|e| corrupt(id, e))?;
        let content = row.content.0;
        if content.resource_type() != resource_type {
            return Err(CoreError::Internal(format!(
                "commercial_resources row {id} has type {resource_type} but {} content",
                content.resource_type()
            )));
        }

        Ok(CommercialResource {
            id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            resource_type,
            phase: row
                .phase
                .parse::<ResourcePhase>()
                .map_err(|e| corrupt(id, e))?,
            category: row
                .category
                .parse::<ResourceCategory>()
                .map_err(|e| corrupt(id, e))?,
            content,
            placeholders: row.placeholders.0,
            tags: row.tags,
            access_roles: row.access_roles,
            is_active: row.is_active,
            version: row.version,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One `GROUP BY` bucket from the stats queries.
#[derive(Debug, Clone, FromRow)]
pub struct CountRow {
    pub key: String,
    pub count: i64,
}
