//! Storage abstraction for commercial resources, leads and usage records.
//!
//! [`ResourceStore`] is injected into [`crate::service::ResourceService`] so the
//! PostgreSQL backend (`lapublica-db`) and the [`memory::InMemoryStore`] used in
//! tests are interchangeable.
//!
//! Implementations must be `Send + Sync`; one instance is shared by every
//! request handler.

pub mod memory;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::lead::LeadData;
use crate::resource::{
    CommercialResource, NewResource, ResourceChanges, ResourceFilter, ResourceStats,
};
use crate::types::DbId;
use crate::usage::{NewResourceUsage, ResourceUsage};

/// Data access required by the resource service.
///
/// # Contract
///
/// - Slugs are unique; creating or renaming into a taken slug returns
///   [`CoreError::Conflict`].
/// - `create_resource` derives the stored type from `input.content` and
///   defaults a missing version to [`crate::resource::INITIAL_VERSION`].
/// - Usage records are append-only.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn create_resource(
        &self,
        input: &NewResource,
        created_by: DbId,
    ) -> Result<CommercialResource, CoreError>;

    async fn find_resource_by_id(&self, id: DbId)
        -> Result<Option<CommercialResource>, CoreError>;

    async fn find_resource_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CommercialResource>, CoreError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError>;

    /// List resources matching `filter`, most recently updated first.
    async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<CommercialResource>, CoreError>;

    /// Apply `changes`. Returns `None` if the resource does not exist.
    async fn update_resource(
        &self,
        id: DbId,
        changes: &ResourceChanges,
    ) -> Result<Option<CommercialResource>, CoreError>;

    /// Soft-delete: set `is_active = false`. Returns `true` if a row changed.
    async fn deactivate_resource(&self, id: DbId) -> Result<bool, CoreError>;

    async fn find_lead(&self, id: DbId) -> Result<Option<LeadData>, CoreError>;

    async fn record_usage(&self, input: &NewResourceUsage) -> Result<ResourceUsage, CoreError>;

    /// Usage history for one resource, newest first.
    async fn list_usages(
        &self,
        resource_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResourceUsage>, CoreError>;

    async fn resource_stats(&self) -> Result<ResourceStats, CoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }
}
