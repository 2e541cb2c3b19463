//! In-memory [`ResourceStore`] implementation for tests and local demos.
//!
//! All state lives behind one `std::sync::RwLock`; no lock is held across an
//! await point.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::CoreError;
use crate::lead::LeadData;
use crate::resource::{
    CommercialResource, NewResource, ResourceChanges, ResourceFilter, ResourceStats,
    INITIAL_VERSION,
};
use crate::types::DbId;
use crate::usage::{NewResourceUsage, ResourceUsage};

use super::ResourceStore;

#[derive(Default)]
struct MemoryState {
    resources: BTreeMap<DbId, CommercialResource>,
    leads: HashMap<DbId, LeadData>,
    usages: Vec<ResourceUsage>,
    next_resource_id: DbId,
    next_usage_id: DbId,
}

/// In-memory store. Ids start at 1 and increase monotonically.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fail_usage_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a lead record.
    pub fn insert_lead(&self, lead: LeadData) {
        if let Ok(mut state) = self.state.write() {
            state.leads.insert(lead.id, lead);
        }
    }

    /// Make subsequent `record_usage` calls fail with an internal error.
    pub fn set_fail_usage_writes(&self, fail: bool) {
        self.fail_usage_writes.store(fail, Ordering::SeqCst);
    }

    /// Every usage record, oldest first.
    pub fn usages(&self) -> Vec<ResourceUsage> {
        self.state
            .read()
            .map(|state| state.usages.clone())
            .unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, CoreError> {
        self.state
            .read()
            .map_err(|_| CoreError::Internal("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, CoreError> {
        self.state
            .write()
            .map_err(|_| CoreError::Internal("in-memory store lock poisoned".into()))
    }
}

fn slug_conflict(slug: &str) -> CoreError {
    CoreError::Conflict(format!("A resource with slug '{slug}' already exists"))
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn create_resource(
        &self,
        input: &NewResource,
        created_by: DbId,
    ) -> Result<CommercialResource, CoreError> {
        let mut state = self.write()?;
        if state.resources.values().any(|r| r.slug == input.slug) {
            return Err(slug_conflict(&input.slug));
        }

        state.next_resource_id += 1;
        let now = Utc::now();
        let resource = CommercialResource {
            id: state.next_resource_id,
            slug: input.slug.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            resource_type: input.content.resource_type(),
            phase: input.phase,
            category: input.category,
            content: input.content.clone(),
            placeholders: input.placeholders.clone(),
            tags: input.tags.clone(),
            access_roles: input.access_roles.clone(),
            is_active: true,
            version: input
                .version
                .clone()
                .unwrap_or_else(|| INITIAL_VERSION.to_string()),
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };
        state.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn find_resource_by_id(
        &self,
        id: DbId,
    ) -> Result<Option<CommercialResource>, CoreError> {
        Ok(self.read()?.resources.get(&id).cloned())
    }

    async fn find_resource_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CommercialResource>, CoreError> {
        Ok(self
            .read()?
            .resources
            .values()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError> {
        Ok(self.read()?.resources.values().any(|r| r.slug == slug))
    }

    async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<CommercialResource>, CoreError> {
        let state = self.read()?;
        let mut items: Vec<CommercialResource> = state
            .resources
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(items
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn update_resource(
        &self,
        id: DbId,
        changes: &ResourceChanges,
    ) -> Result<Option<CommercialResource>, CoreError> {
        let mut state = self.write()?;
        let Some(resource) = state.resources.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            resource.title = title.clone();
        }
        if let Some(description) = &changes.description {
            resource.description = Some(description.clone());
        }
        if let Some(phase) = changes.phase {
            resource.phase = phase;
        }
        if let Some(category) = changes.category {
            resource.category = category;
        }
        if let Some(content) = &changes.content {
            resource.resource_type = content.resource_type();
            resource.content = content.clone();
        }
        if let Some(placeholders) = &changes.placeholders {
            resource.placeholders = placeholders.clone();
        }
        if let Some(tags) = &changes.tags {
            resource.tags = tags.clone();
        }
        if let Some(access_roles) = &changes.access_roles {
            resource.access_roles = access_roles.clone();
        }
        if let Some(is_active) = changes.is_active {
            resource.is_active = is_active;
        }
        if let Some(version) = &changes.version {
            resource.version = version.clone();
        }
        resource.updated_at = Utc::now();

        Ok(Some(resource.clone()))
    }

    async fn deactivate_resource(&self, id: DbId) -> Result<bool, CoreError> {
        let mut state = self.write()?;
        match state.resources.get_mut(&id) {
            Some(resource) if resource.is_active => {
                resource.is_active = false;
                resource.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_lead(&self, id: DbId) -> Result<Option<LeadData>, CoreError> {
        Ok(self.read()?.leads.get(&id).cloned())
    }

    async fn record_usage(&self, input: &NewResourceUsage) -> Result<ResourceUsage, CoreError> {
        if self.fail_usage_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("usage write failed".into()));
        }

        let mut state = self.write()?;
        state.next_usage_id += 1;
        let usage = ResourceUsage {
            id: state.next_usage_id,
            resource_id: input.resource_id,
            lead_id: input.lead_id,
            user_id: input.user_id,
            content: input.content.clone(),
            placeholder_values: input.placeholder_values.clone(),
            context: input.context.clone(),
            created_at: Utc::now(),
        };
        state.usages.push(usage.clone());
        Ok(usage)
    }

    async fn list_usages(
        &self,
        resource_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResourceUsage>, CoreError> {
        let state = self.read()?;
        Ok(state
            .usages
            .iter()
            .rev()
            .filter(|u| u.resource_id == resource_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn resource_stats(&self) -> Result<ResourceStats, CoreError> {
        let state = self.read()?;
        let mut stats = ResourceStats {
            total: state.resources.len() as i64,
            total_usages: state.usages.len() as i64,
            ..Default::default()
        };
        for resource in state.resources.values() {
            if resource.is_active {
                stats.active += 1;
            }
            *stats
                .by_type
                .entry(resource.resource_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_phase
                .entry(resource.phase.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }
}
