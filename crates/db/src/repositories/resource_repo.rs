//! Repository for the `commercial_resources` table.

use lapublica_core::resource::{NewResource, ResourceChanges, ResourceFilter, INITIAL_VERSION};
use lapublica_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::resource::{CountRow, ResourceRow};

/// Column list for commercial_resources queries.
const COLUMNS: &str = "id, slug, title, description, resource_type, phase, category, content, \
                       placeholders, tags, access_roles, is_active, version, created_by, \
                       created_at, updated_at";

/// Escape `LIKE` metacharacters and wrap the term for a substring match.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub struct ResourceRepo;

impl ResourceRepo {
    /// Insert a new resource, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewResource,
        created_by: DbId,
    ) -> Result<ResourceRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO commercial_resources
                (slug, title, description, resource_type, phase, category, content,
                 placeholders, tags, access_roles, version, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, '{INITIAL_VERSION}'), $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceRow>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.content.resource_type().as_str())
            .bind(input.phase.as_str())
            .bind(input.category.as_str())
            .bind(Json(&input.content))
            .bind(Json(&input.placeholders))
            .bind(&input.tags)
            .bind(&input.access_roles)
            .bind(&input.version)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ResourceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM commercial_resources WHERE id = $1");
        sqlx::query_as::<_, ResourceRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<ResourceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM commercial_resources WHERE slug = $1");
        sqlx::query_as::<_, ResourceRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM commercial_resources WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// List resources matching `filter`, most recently updated first.
    ///
    /// Every filter is optional; a NULL parameter disables its clause.
    pub async fn list(
        pool: &PgPool,
        filter: &ResourceFilter,
    ) -> Result<Vec<ResourceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM commercial_resources
             WHERE ($1 OR is_active)
               AND ($2::TEXT IS NULL OR resource_type = $2)
               AND ($3::TEXT IS NULL OR phase = $3)
               AND ($4::TEXT IS NULL OR category = $4)
               AND ($5::TEXT IS NULL OR $5 = ANY(tags))
               AND ($6::TEXT IS NULL OR $6 = ANY(access_roles))
               AND ($7::TEXT IS NULL OR title ILIKE $7 OR description ILIKE $7)
             ORDER BY updated_at DESC, id DESC
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, ResourceRow>(&query)
            .bind(filter.include_inactive)
            .bind(filter.resource_type.map(|t| t.as_str()))
            .bind(filter.phase.map(|p| p.as_str()))
            .bind(filter.category.map(|c| c.as_str()))
            .bind(&filter.tag)
            .bind(&filter.accessible_to)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update, returning the updated row.
    ///
    /// `resource_type` follows `content` when new content is supplied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &ResourceChanges,
    ) -> Result<Option<ResourceRow>, sqlx::Error> {
        let query = format!(
            "UPDATE commercial_resources SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                phase = COALESCE($4, phase),
                category = COALESCE($5, category),
                resource_type = COALESCE($6, resource_type),
                content = COALESCE($7, content),
                placeholders = COALESCE($8, placeholders),
                tags = COALESCE($9, tags),
                access_roles = COALESCE($10, access_roles),
                is_active = COALESCE($11, is_active),
                version = COALESCE($12, version),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceRow>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.phase.map(|p| p.as_str()))
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.content.as_ref().map(|c| c.resource_type().as_str()))
            .bind(changes.content.as_ref().map(Json))
            .bind(changes.placeholders.as_ref().map(Json))
            .bind(&changes.tags)
            .bind(&changes.access_roles)
            .bind(changes.is_active)
            .bind(&changes.version)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a resource. Returns `true` if an active row was deactivated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE commercial_resources SET is_active = FALSE, updated_at = NOW()
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `(total, active)`.
    pub async fn count_totals(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM commercial_resources",
        )
        .fetch_one(pool)
        .await
    }

    pub async fn count_by_type(pool: &PgPool) -> Result<Vec<CountRow>, sqlx::Error> {
        sqlx::query_as::<_, CountRow>(
            "SELECT resource_type AS key, COUNT(*) AS count
             FROM commercial_resources GROUP BY resource_type ORDER BY resource_type",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_phase(pool: &PgPool) -> Result<Vec<CountRow>, sqlx::Error> {
        sqlx::query_as::<_, CountRow>(
            "SELECT phase AS key, COUNT(*) AS count
             FROM commercial_resources GROUP BY phase ORDER BY phase",
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("guió"), "%guió%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
