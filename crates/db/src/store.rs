//! [`ResourceStore`] over PostgreSQL.

use async_trait::async_trait;
use lapublica_core::error::CoreError;
use lapublica_core::lead::LeadData;
use lapublica_core::resource::{
    CommercialResource, NewResource, ResourceChanges, ResourceFilter, ResourceStats,
};
use lapublica_core::store::ResourceStore;
use lapublica_core::types::DbId;
use lapublica_core::usage::{NewResourceUsage, ResourceUsage};

use crate::repositories::{LeadRepo, ResourceRepo, ResourceUsageRepo};
use crate::DbPool;

/// Unique constraint guarding `commercial_resources.slug`.
const SLUG_CONSTRAINT: &str = "uq_commercial_resources_slug";

/// Map a sqlx error to a domain error.
///
/// Unique violations on the slug constraint become [`CoreError::Conflict`].
/// Everything else is logged and reported as an opaque internal error.
fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(SLUG_CONSTRAINT)
        {
            return CoreError::Conflict("A resource with this slug already exists".into());
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("Database error".into())
}

/// PostgreSQL-backed store. Cheap to clone.
#[derive(Clone)]
pub struct PgResourceStore {
    pool: DbPool,
}

impl PgResourceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn create_resource(
        &self,
        input: &NewResource,
        created_by: DbId,
    ) -> Result<CommercialResource, CoreError> {
        ResourceRepo::create(&self.pool, input, created_by)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn find_resource_by_id(
        &self,
        id: DbId,
    ) -> Result<Option<CommercialResource>, CoreError> {
        ResourceRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(CommercialResource::try_from)
            .transpose()
    }

    async fn find_resource_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CommercialResource>, CoreError> {
        ResourceRepo::find_by_slug(&self.pool, slug)
            .await
            .map_err(map_db_error)?
            .map(CommercialResource::try_from)
            .transpose()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError> {
        ResourceRepo::slug_exists(&self.pool, slug)
            .await
            .map_err(map_db_error)
    }

    async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<CommercialResource>, CoreError> {
        ResourceRepo::list(&self.pool, filter)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(CommercialResource::try_from)
            .collect()
    }

    async fn update_resource(
        &self,
        id: DbId,
        changes: &ResourceChanges,
    ) -> Result<Option<CommercialResource>, CoreError> {
        ResourceRepo::update(&self.pool, id, changes)
            .await
            .map_err(map_db_error)?
            .map(CommercialResource::try_from)
            .transpose()
    }

    async fn deactivate_resource(&self, id: DbId) -> Result<bool, CoreError> {
        ResourceRepo::deactivate(&self.pool, id)
            .await
            .map_err(map_db_error)
    }

    async fn find_lead(&self, id: DbId) -> Result<Option<LeadData>, CoreError> {
        Ok(LeadRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(LeadData::from))
    }

    async fn record_usage(&self, input: &NewResourceUsage) -> Result<ResourceUsage, CoreError> {
        ResourceUsageRepo::create(&self.pool, input)
            .await
            .map(ResourceUsage::from)
            .map_err(map_db_error)
    }

    async fn list_usages(
        &self,
        resource_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResourceUsage>, CoreError> {
        Ok(
            ResourceUsageRepo::list_by_resource(&self.pool, resource_id, limit, offset)
                .await
                .map_err(map_db_error)?
                .into_iter()
                .map(ResourceUsage::from)
                .collect(),
        )
    }

    async fn resource_stats(&self) -> Result<ResourceStats, CoreError> {
        let (total, active) = ResourceRepo::count_totals(&self.pool)
            .await
            .map_err(map_db_error)?;
        let by_type = ResourceRepo::count_by_type(&self.pool)
            .await
            .map_err(map_db_error)?;
        let by_phase = ResourceRepo::count_by_phase(&self.pool)
            .await
            .map_err(map_db_error)?;
        let total_usages = ResourceUsageRepo::count(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(ResourceStats {
            total,
            active,
            by_type: by_type.into_iter().map(|r| (r.key, r.count)).collect(),
            by_phase: by_phase.into_iter().map(|r| (r.key, r.count)).collect(),
            total_usages,
        })
    }

    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(map_db_error)
    }
}
