//! Repository for the append-only `resource_usages` table.

use lapublica_core::types::DbId;
use lapublica_core::usage::NewResourceUsage;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::usage::ResourceUsageRow;

/// Column list for resource_usages queries.
const COLUMNS: &str =
    "id, resource_id, lead_id, user_id, content, placeholder_values, context, created_at";

pub struct ResourceUsageRepo;

impl ResourceUsageRepo {
    /// Insert a usage record, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewResourceUsage,
    ) -> Result<ResourceUsageRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO resource_usages
                (resource_id, lead_id, user_id, content, placeholder_values, context)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceUsageRow>(&query)
            .bind(input.resource_id)
            .bind(input.lead_id)
            .bind(input.user_id)
            .bind(&input.content)
            .bind(Json(&input.placeholder_values))
            .bind(&input.context)
            .fetch_one(pool)
            .await
    }

    /// Usage history for one resource, newest first.
    pub async fn list_by_resource(
        pool: &PgPool,
        resource_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResourceUsageRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resource_usages
             WHERE resource_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ResourceUsageRow>(&query)
            .bind(resource_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total number of usage records.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resource_usages")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
