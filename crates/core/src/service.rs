//! Resource operations: CRUD with access control, placeholder extraction and
//! usage auditing.
//!
//! Every operation runs to completion inside one request. The only write on
//! the extraction path is the audit append; if it fails the rendered content
//! is still returned and `usage_recorded` is `false`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::placeholders::{process, ContentPreview, ResolvedValues};
use crate::resolution::{PlaceholderConfig, SystemProfile};
use crate::resource::{
    bump_minor_version, validate_dto, CommercialResource, NewResource, Placeholder,
    ResourceCategory, ResourceChanges, ResourceContent, ResourceFilter, ResourcePhase,
    ResourceStats, ResourceType, ResourceUpdate, INITIAL_VERSION, MAX_SLUG_LEN,
};
use crate::roles::{ensure_access, ensure_privileged, is_privileged};
use crate::store::ResourceStore;
use crate::types::{clamp_limit, clamp_offset, DbId};
use crate::usage::{NewResourceUsage, ResourceUsage};
use crate::validation::{
    validate_declared_placeholders, validate_placeholder_values, validate_required_placeholders,
    ValueValidation,
};

/// Upper bound on numbered suffixes tried when generating a duplicate slug.
const MAX_DUPLICATE_ATTEMPTS: u32 = 100;

/// `<slug>-copy`, with the stem cut so the longest numbered candidate
/// (`-copy-100`) still fits in [`MAX_SLUG_LEN`].
fn copy_slug_base(slug: &str) -> String {
    let reserve = "-copy-".len() + MAX_DUPLICATE_ATTEMPTS.to_string().len();
    let max_stem = MAX_SLUG_LEN.saturating_sub(reserve);
    // Slugs are ASCII, so byte slicing stays on char boundaries.
    let stem = if slug.len() > max_stem {
        slug[..max_stem].trim_end_matches('-')
    } else {
        slug
    };
    format!("{stem}-copy")
}

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
    pub name: Option<String>,
}

/// Optional list filters supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub resource_type: Option<ResourceType>,
    pub phase: Option<ResourcePhase>,
    pub category: Option<ResourceCategory>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub resource_id: DbId,
    pub lead_id: DbId,
    pub user_name: Option<String>,
    pub custom_values: ResolvedValues,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRequest {
    pub lead_id: Option<DbId>,
    pub user_name: Option<String>,
    pub custom_values: ResolvedValues,
}

#[derive(Debug, Clone)]
pub struct RecordUsageRequest {
    pub lead_id: DbId,
    pub content: String,
    pub placeholder_values: ResolvedValues,
    pub context: Option<String>,
}

/// Result of [`ResourceService::extract_content`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub resource: CommercialResource,
    pub extracted_content: ContentPreview,
    pub placeholder_values: ResolvedValues,
    pub usage_recorded: bool,
}

/// Result of [`ResourceService::preview_content`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewedContent {
    pub resource_id: DbId,
    pub preview: ContentPreview,
    pub placeholder_values: ResolvedValues,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Resource operations over an injected [`ResourceStore`].
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn ResourceStore>,
    profile: SystemProfile,
}

impl ResourceService {
    pub fn new(store: Arc<dyn ResourceStore>, profile: SystemProfile) -> Self {
        Self { store, profile }
    }

    pub fn profile(&self) -> &SystemProfile {
        &self.profile
    }

    /// Whether the backing store answers a probe.
    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    // -- lookups ------------------------------------------------------------

    async fn load_resource(&self, id: DbId) -> Result<CommercialResource, CoreError> {
        self.store
            .find_resource_by_id(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CommercialResource",
                id,
            })
    }

    /// Load a resource the actor may read. Inactive resources are invisible
    /// to non-privileged callers.
    async fn load_visible(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> Result<CommercialResource, CoreError> {
        let resource = self.load_resource(id).await?;
        check_visible(actor, &resource)?;
        Ok(resource)
    }

    async fn load_lead_exists(&self, id: DbId) -> Result<crate::lead::LeadData, CoreError> {
        self.store
            .find_lead(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Lead", id })
    }

    // -- CRUD ---------------------------------------------------------------

    pub async fn create_resource(
        &self,
        actor: &Actor,
        mut input: NewResource,
    ) -> Result<CommercialResource, CoreError> {
        ensure_privileged(&actor.role)?;
        validate_dto(&input)?;
        check_authoring(&input.content, &input.placeholders)?;
        if input.version.is_none() {
            input.version = Some(INITIAL_VERSION.to_string());
        }

        let resource = self.store.create_resource(&input, actor.user_id).await?;
        tracing::info!(
            resource_id = resource.id,
            slug = %resource.slug,
            resource_type = %resource.resource_type,
            user_id = actor.user_id,
            "Commercial resource created",
        );
        Ok(resource)
    }

    pub async fn get_resource_by_id(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> Result<CommercialResource, CoreError> {
        self.load_visible(actor, id).await
    }

    pub async fn get_resource_by_slug(
        &self,
        actor: &Actor,
        slug: &str,
    ) -> Result<CommercialResource, CoreError> {
        let resource = self
            .store
            .find_resource_by_slug(slug)
            .await?
            .ok_or_else(|| CoreError::NotFoundByKey {
                entity: "CommercialResource",
                key: slug.to_string(),
            })?;
        check_visible(actor, &resource)?;
        Ok(resource)
    }

    /// List resources. Non-privileged callers only see active resources whose
    /// allow-list contains their role.
    pub async fn list_resources(
        &self,
        actor: &Actor,
        query: ResourceQuery,
    ) -> Result<Vec<CommercialResource>, CoreError> {
        let privileged = is_privileged(&actor.role);
        let filter = ResourceFilter {
            resource_type: query.resource_type,
            phase: query.phase,
            category: query.category,
            tag: query.tag.filter(|t| !t.trim().is_empty()),
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            accessible_to: (!privileged).then(|| actor.role.clone()),
            include_inactive: privileged && query.include_inactive,
            limit: clamp_limit(query.limit),
            offset: clamp_offset(query.offset),
        };
        let items = self.store.list_resources(&filter).await?;
        tracing::debug!(count = items.len(), role = %actor.role, "Listed commercial resources");
        Ok(items)
    }

    pub async fn update_resource(
        &self,
        actor: &Actor,
        id: DbId,
        update: ResourceUpdate,
    ) -> Result<CommercialResource, CoreError> {
        ensure_privileged(&actor.role)?;
        validate_dto(&update)?;
        let existing = self.load_resource(id).await?;

        if update.content.is_some() || update.placeholders.is_some() {
            let content = update.content.as_ref().unwrap_or(&existing.content);
            let placeholders = update
                .placeholders
                .as_deref()
                .unwrap_or(&existing.placeholders);
            check_authoring(content, placeholders)?;
        }

        let version = update
            .new_version
            .then(|| bump_minor_version(&existing.version));
        let changes = ResourceChanges {
            title: update.title,
            description: update.description,
            phase: update.phase,
            category: update.category,
            content: update.content,
            placeholders: update.placeholders,
            tags: update.tags,
            access_roles: update.access_roles,
            is_active: update.is_active,
            version,
        };

        let updated = self
            .store
            .update_resource(id, &changes)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CommercialResource",
                id,
            })?;
        tracing::info!(
            resource_id = id,
            version = %updated.version,
            user_id = actor.user_id,
            "Commercial resource updated",
        );
        Ok(updated)
    }

    /// Soft-delete. Deleting an already inactive resource is a no-op.
    pub async fn delete_resource(&self, actor: &Actor, id: DbId) -> Result<(), CoreError> {
        ensure_privileged(&actor.role)?;
        self.load_resource(id).await?;
        let changed = self.store.deactivate_resource(id).await?;
        tracing::info!(resource_id = id, changed, user_id = actor.user_id, "Commercial resource deactivated");
        Ok(())
    }

    /// Copy a resource under a fresh slug. The copy starts at version 1.0 and
    /// is owned by the acting user.
    pub async fn duplicate_resource(
        &self,
        actor: &Actor,
        id: DbId,
        request: DuplicateRequest,
    ) -> Result<CommercialResource, CoreError> {
        ensure_privileged(&actor.role)?;
        let source = self.load_resource(id).await?;

        let slug = match request.slug {
            Some(slug) => {
                if self.store.slug_exists(&slug).await? {
                    return Err(CoreError::Conflict(format!(
                        "A resource with slug '{slug}' already exists"
                    )));
                }
                slug
            }
            None => self.next_free_slug(&copy_slug_base(&source.slug)).await?,
        };

        let input = NewResource {
            slug,
            title: request
                .title
                .unwrap_or_else(|| format!("{} (còpia)", source.title)),
            description: source.description.clone(),
            phase: source.phase,
            category: source.category,
            content: source.content.clone(),
            placeholders: source.placeholders.clone(),
            tags: source.tags.clone(),
            access_roles: source.access_roles.clone(),
            version: Some(INITIAL_VERSION.to_string()),
        };
        validate_dto(&input)?;

        let copy = self.store.create_resource(&input, actor.user_id).await?;
        tracing::info!(
            source_id = id,
            resource_id = copy.id,
            slug = %copy.slug,
            user_id = actor.user_id,
            "Commercial resource duplicated",
        );
        Ok(copy)
    }

    async fn next_free_slug(&self, base: &str) -> Result<String, CoreError> {
        if !self.store.slug_exists(base).await? {
            return Ok(base.to_string());
        }
        for n in 2..=MAX_DUPLICATE_ATTEMPTS {
            let candidate = format!("{base}-{n}");
            if !self.store.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(CoreError::Conflict(format!(
            "Could not find a free slug for '{base}'"
        )))
    }

    // -- templating ---------------------------------------------------------

    fn resolve(
        &self,
        actor: &Actor,
        user_name: Option<&str>,
        lead: Option<&crate::lead::LeadData>,
        custom_values: ResolvedValues,
        resource: &CommercialResource,
    ) -> (ContentPreview, ResolvedValues) {
        let user_name = user_name.or(actor.name.as_deref());
        let config = PlaceholderConfig::build(Utc::now(), &self.profile, user_name, lead, custom_values);
        let merged = config.merged();
        let mut preview = process(&resource.content.template_text(), &merged);
        preview.warnings.extend(config.custom_key_warnings());
        (preview, merged)
    }

    /// Render a resource for a lead and append one usage record.
    pub async fn extract_content(
        &self,
        actor: &Actor,
        request: ExtractRequest,
    ) -> Result<ExtractedContent, CoreError> {
        let resource = self.load_visible(actor, request.resource_id).await?;
        let lead = self.load_lead_exists(request.lead_id).await?;

        let (preview, values) = self.resolve(
            actor,
            request.user_name.as_deref(),
            Some(&lead),
            request.custom_values,
            &resource,
        );

        let usage = NewResourceUsage {
            resource_id: resource.id,
            lead_id: lead.id,
            user_id: actor.user_id,
            content: preview.processed_content.clone(),
            placeholder_values: values.clone(),
            context: request.context,
        };
        let usage_recorded = match self.store.record_usage(&usage).await {
            Ok(row) => {
                tracing::debug!(usage_id = row.id, "Resource usage recorded");
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    resource_id = resource.id,
                    lead_id = lead.id,
                    "Failed to record resource usage",
                );
                false
            }
        };

        tracing::info!(
            resource_id = resource.id,
            lead_id = lead.id,
            user_id = actor.user_id,
            used = preview.placeholders_used.len(),
            missing = preview.missing_placeholders.len(),
            "Resource content extracted",
        );

        Ok(ExtractedContent {
            resource,
            extracted_content: preview,
            placeholder_values: values,
            usage_recorded,
        })
    }

    /// Render a resource without recording usage. The lead is optional.
    pub async fn preview_content(
        &self,
        actor: &Actor,
        resource_id: DbId,
        request: PreviewRequest,
    ) -> Result<PreviewedContent, CoreError> {
        let resource = self.load_visible(actor, resource_id).await?;
        let lead = match request.lead_id {
            Some(lead_id) => Some(self.load_lead_exists(lead_id).await?),
            None => None,
        };
        let (preview, values) = self.resolve(
            actor,
            request.user_name.as_deref(),
            lead.as_ref(),
            request.custom_values,
            &resource,
        );
        Ok(PreviewedContent {
            resource_id,
            preview,
            placeholder_values: values,
        })
    }

    /// Validate caller values against a resource's declared placeholders.
    pub async fn validate_values(
        &self,
        actor: &Actor,
        resource_id: DbId,
        values: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, ValueValidation>, CoreError> {
        let resource = self.load_visible(actor, resource_id).await?;
        Ok(validate_placeholder_values(values, &resource.placeholders))
    }

    // -- usage --------------------------------------------------------------

    /// Append an explicit usage record (e.g. after the user edited the
    /// rendered text before sending it).
    pub async fn record_usage(
        &self,
        actor: &Actor,
        resource_id: DbId,
        request: RecordUsageRequest,
    ) -> Result<ResourceUsage, CoreError> {
        let resource = self.load_visible(actor, resource_id).await?;
        let lead = self.load_lead_exists(request.lead_id).await?;
        let usage = self
            .store
            .record_usage(&NewResourceUsage {
                resource_id: resource.id,
                lead_id: lead.id,
                user_id: actor.user_id,
                content: request.content,
                placeholder_values: request.placeholder_values,
                context: request.context,
            })
            .await?;
        tracing::info!(
            usage_id = usage.id,
            resource_id,
            lead_id = lead.id,
            user_id = actor.user_id,
            "Resource usage recorded",
        );
        Ok(usage)
    }

    pub async fn list_usages(
        &self,
        actor: &Actor,
        resource_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ResourceUsage>, CoreError> {
        self.load_visible(actor, resource_id).await?;
        self.store
            .list_usages(resource_id, clamp_limit(limit), clamp_offset(offset))
            .await
    }

    pub async fn resource_stats(&self, actor: &Actor) -> Result<ResourceStats, CoreError> {
        ensure_privileged(&actor.role)?;
        self.store.resource_stats().await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_visible(actor: &Actor, resource: &CommercialResource) -> Result<(), CoreError> {
    if !resource.is_active && !is_privileged(&actor.role) {
        return Err(CoreError::NotFound {
            entity: "CommercialResource",
            id: resource.id,
        });
    }
    ensure_access(&actor.role, &resource.access_roles)
}

/// Authoring checks shared by create and update.
fn check_authoring(content: &ResourceContent, placeholders: &[Placeholder]) -> Result<(), CoreError> {
    validate_declared_placeholders(placeholders)?;
    let check = validate_required_placeholders(&content.template_text(), placeholders);
    if !check.valid {
        return Err(CoreError::Validation(format!(
            "Required placeholders missing from content: {}",
            check.missing.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
