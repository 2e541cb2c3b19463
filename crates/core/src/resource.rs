//! Commercial resource model: classification enums, typed content, declared
//! placeholders and the create/update/filter DTOs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum length of a resource slug.
pub const MAX_SLUG_LEN: usize = 120;

/// Version assigned to new resources and duplicates.
pub const INITIAL_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Declares a closed string enum with `as_str`, `FromStr` and `Display`.
///
/// Variants serialize as their SCREAMING_SNAKE_CASE database value.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(CoreError::Validation(format!(
                        "Invalid {} '{}'. Must be one of: {}",
                        $label,
                        s,
                        [$($value),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Kind of commercial resource; always matches the content variant.
    ResourceType, "resource type" {
        Speech => "SPEECH",
        EmailTemplate => "EMAIL_TEMPLATE",
        Document => "DOCUMENT",
        Guide => "GUIDE",
        Checklist => "CHECKLIST",
    }
);

string_enum!(
    /// Sales pipeline stage a resource is meant for.
    ResourcePhase, "phase" {
        Prospecting => "PROSPECTING",
        FirstContact => "FIRST_CONTACT",
        Qualification => "QUALIFICATION",
        Proposal => "PROPOSAL",
        Negotiation => "NEGOTIATION",
        Closing => "CLOSING",
        PostSale => "POST_SALE",
    }
);

string_enum!(
    ResourceCategory, "category" {
        Sales => "SALES",
        Marketing => "MARKETING",
        Onboarding => "ONBOARDING",
        Training => "TRAINING",
        Legal => "LEGAL",
        Support => "SUPPORT",
    }
);

string_enum!(
    /// Where a declared placeholder's value is expected to come from.
    PlaceholderKind, "placeholder type" {
        Company => "COMPANY",
        Contact => "CONTACT",
        System => "SYSTEM",
        Custom => "CUSTOM",
    }
);

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objection {
    pub objection: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideStep {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

/// Structured resource payload, one variant per [`ResourceType`].
///
/// Stored as JSONB with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ResourceContent {
    Speech {
        script: String,
        #[serde(default)]
        key_points: Vec<String>,
        #[serde(default)]
        objections: Vec<Objection>,
    },
    EmailTemplate {
        subject: String,
        body: String,
    },
    Document {
        body: String,
        #[serde(default)]
        sections: Vec<DocumentSection>,
    },
    Guide {
        introduction: String,
        #[serde(default)]
        steps: Vec<GuideStep>,
    },
    Checklist {
        #[serde(default)]
        title: Option<String>,
        items: Vec<ChecklistItem>,
    },
}

impl ResourceContent {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Speech { .. } => ResourceType::Speech,
            Self::EmailTemplate { .. } => ResourceType::EmailTemplate,
            Self::Document { .. } => ResourceType::Document,
            Self::Guide { .. } => ResourceType::Guide,
            Self::Checklist { .. } => ResourceType::Checklist,
        }
    }

    /// The text that placeholder substitution runs over.
    pub fn template_text(&self) -> String {
        match self {
            Self::Speech { script, .. } => script.clone(),
            Self::EmailTemplate { subject, body } => format!("{subject}\n\n{body}"),
            Self::Document { body, sections } => {
                let mut out = body.clone();
                for section in sections {
                    push_block(&mut out, &format!("## {}\n\n{}", section.heading, section.body));
                }
                out
            }
            Self::Guide {
                introduction,
                steps,
            } => {
                let mut out = introduction.clone();
                for (i, step) in steps.iter().enumerate() {
                    push_block(
                        &mut out,
                        &format!("{}. {}\n{}", i + 1, step.title, step.description),
                    );
                }
                out
            }
            Self::Checklist { title, items } => {
                let mut out = title.clone().unwrap_or_default();
                let list = items
                    .iter()
                    .map(|item| format!("- [ ] {}", item.label))
                    .collect::<Vec<_>>()
                    .join("\n");
                push_block(&mut out, &list);
                out
            }
        }
    }
}

fn push_block(out: &mut String, block: &str) {
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(block);
}

// ---------------------------------------------------------------------------
// Declared placeholders
// ---------------------------------------------------------------------------

/// Optional constraints applied to a single placeholder value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderRules {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
}

/// Token metadata declared by a resource. Describes a key, holds no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<PlaceholderRules>,
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialResource {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub phase: ResourcePhase,
    pub category: ResourceCategory,
    pub content: ResourceContent,
    pub placeholders: Vec<Placeholder>,
    pub tags: Vec<String>,
    pub access_roles: Vec<String>,
    pub is_active: bool,
    pub version: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Aggregate counts over all resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub total: i64,
    pub active: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_phase: BTreeMap<String, i64>,
    pub total_usages: i64,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a resource.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub phase: ResourcePhase,
    pub category: ResourceCategory,
    pub content: ResourceContent,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub access_roles: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// DTO for partially updating a resource. `new_version` bumps the minor version.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub phase: Option<ResourcePhase>,
    pub category: Option<ResourceCategory>,
    pub content: Option<ResourceContent>,
    pub placeholders: Option<Vec<Placeholder>>,
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
    pub access_roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub new_version: bool,
}

/// Fully-resolved column changes handed to the store. `None` keeps the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub phase: Option<ResourcePhase>,
    pub category: Option<ResourceCategory>,
    pub content: Option<ResourceContent>,
    pub placeholders: Option<Vec<Placeholder>>,
    pub tags: Option<Vec<String>>,
    pub access_roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub version: Option<String>,
}

/// List filter. `accessible_to` restricts results to resources whose
/// allow-list contains that role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub resource_type: Option<ResourceType>,
    pub phase: Option<ResourcePhase>,
    pub category: Option<ResourceCategory>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub accessible_to: Option<String>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}

impl ResourceFilter {
    pub fn matches(&self, resource: &CommercialResource) -> bool {
        if !self.include_inactive && !resource.is_active {
            return false;
        }
        if self.resource_type.is_some_and(|t| t != resource.resource_type)
            || self.phase.is_some_and(|p| p != resource.phase)
            || self.category.is_some_and(|c| c != resource.category)
        {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !resource.tags.contains(tag) {
                return false;
            }
        }
        if let Some(role) = &self.accessible_to {
            if !resource.access_roles.contains(role) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = resource.title.to_lowercase().contains(&needle);
            let in_description = resource
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Slugs are lowercase ASCII letters, digits and single hyphens.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            format!(
                "Slug must be 1-{MAX_SLUG_LEN} lowercase letters, digits or single hyphens"
            )
            .into(),
        ))
    }
}

/// Join `validator` field errors into one sorted, human-readable string.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", err.code),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Run `validator` checks on a DTO and map failures to `CoreError::Validation`.
pub fn validate_dto<T: Validate>(dto: &T) -> Result<(), CoreError> {
    dto.validate()
        .map_err(|errors| CoreError::Validation(validation_message(&errors)))
}

/// Bump the minor component of a `major.minor` version string.
///
/// `"1.0"` -> `"1.1"`, `"2"` -> `"2.1"`. Unparsable or saturated versions get
/// `.1` appended.
pub fn bump_minor_version(version: &str) -> String {
    let mut parts = version.trim().splitn(2, '.');
    let major = parts.next().unwrap_or_default();
    let minor = parts.next();

    if major.parse::<u32>().is_err() {
        return format!("{version}.1");
    }
    match minor {
        None => format!("{major}.1"),
        Some(m) => match m.parse::<u32>().ok().and_then(|n| n.checked_add(1)) {
            Some(next) => format!("{major}.{next}"),
            None => format!("{version}.1"),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
