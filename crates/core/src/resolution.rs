//! Builds the per-invocation value table for placeholder substitution.
//!
//! Four namespaces are merged in a fixed order: system, company, contact,
//! custom. Later namespaces overwrite earlier ones, so caller-supplied custom
//! values always win.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lead::{split_name, LeadData};
use crate::placeholders::{namespace_prefix, PlaceholderNamespace, ResolvedValues};
use crate::types::Timestamp;

/// Literal written for optional lead fields that have no value.
pub const NOT_SPECIFIED: &str = "No especificat";

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";
const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

// ---------------------------------------------------------------------------
// Operator profile
// ---------------------------------------------------------------------------

/// Static operator information exposed under the `system.` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProfile {
    pub platform_name: String,
    pub platform_email: String,
    pub platform_phone: String,
    pub platform_website: String,
}

impl Default for SystemProfile {
    fn default() -> Self {
        Self {
            platform_name: "La Pública".into(),
            platform_email: "info@lapublica.cat".into(),
            platform_phone: "+34 900 000 000".into(),
            platform_website: "https://lapublica.cat".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PlaceholderConfig
// ---------------------------------------------------------------------------

/// The four value namespaces for one substitution call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderConfig {
    pub system: ResolvedValues,
    pub company: ResolvedValues,
    pub contact: ResolvedValues,
    pub custom: ResolvedValues,
}

impl PlaceholderConfig {
    /// Assemble every namespace. `lead` is optional so previews can run
    /// without one; the company and contact namespaces are then empty.
    pub fn build(
        now: Timestamp,
        profile: &SystemProfile,
        user_name: Option<&str>,
        lead: Option<&LeadData>,
        custom: ResolvedValues,
    ) -> Self {
        Self {
            system: system_values(now, profile, user_name),
            company: lead.map(company_values).unwrap_or_default(),
            contact: lead.map(contact_values).unwrap_or_default(),
            custom,
        }
    }

    /// Merge all namespaces into one lookup table.
    pub fn merged(&self) -> ResolvedValues {
        let mut merged = ResolvedValues::new();
        for source in [&self.system, &self.company, &self.contact, &self.custom] {
            for (key, value) in source {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Warnings for custom keys whose namespace is not registered.
    pub fn custom_key_warnings(&self) -> Vec<String> {
        self.custom
            .keys()
            .filter(|key| PlaceholderNamespace::of_key(key).is_none())
            .map(|key| {
                format!(
                    "Custom value '{key}' uses unknown namespace '{}'",
                    namespace_prefix(key)
                )
            })
            .collect()
    }
}

fn text(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

fn optional_text(value: Option<&str>) -> Value {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => text(v),
        _ => text(NOT_SPECIFIED),
    }
}

/// `system.*` values: clock, acting user and operator profile.
pub fn system_values(
    now: Timestamp,
    profile: &SystemProfile,
    user_name: Option<&str>,
) -> ResolvedValues {
    let mut values = ResolvedValues::new();
    values.insert("system.date".into(), text(now.format(DATE_FORMAT).to_string()));
    values.insert("system.time".into(), text(now.format(TIME_FORMAT).to_string()));
    values.insert(
        "system.datetime".into(),
        text(now.format(DATETIME_FORMAT).to_string()),
    );
    values.insert("system.year".into(), text(now.format("%Y").to_string()));
    values.insert(
        "system.user_name".into(),
        text(user_name.map(str::trim).unwrap_or_default()),
    );
    values.insert("system.platform_name".into(), text(&profile.platform_name));
    values.insert("system.platform_email".into(), text(&profile.platform_email));
    values.insert("system.platform_phone".into(), text(&profile.platform_phone));
    values.insert(
        "system.platform_website".into(),
        text(&profile.platform_website),
    );
    values
}

/// `company.*` values derived from the lead.
///
/// `company.name` is copied as-is: an empty company name must surface as a
/// missing placeholder rather than the "not specified" literal.
pub fn company_values(lead: &LeadData) -> ResolvedValues {
    let mut values = ResolvedValues::new();
    values.insert("company.name".into(), text(lead.company_name.trim()));
    values.insert(
        "company.estimated_revenue".into(),
        match lead.estimated_revenue {
            Some(amount) if amount.is_finite() => text(format_eur(amount)),
            _ => text(NOT_SPECIFIED),
        },
    );
    values.insert("company.priority".into(), optional_text(lead.priority.as_deref()));
    values.insert("company.status".into(), optional_text(lead.status.as_deref()));
    values.insert(
        "company.created_at".into(),
        text(lead.created_at.format(DATE_FORMAT).to_string()),
    );
    values
}

/// `contact.*` values derived from the lead.
pub fn contact_values(lead: &LeadData) -> ResolvedValues {
    let (first, last) = split_name(&lead.contact_name);
    let mut values = ResolvedValues::new();
    values.insert("contact.name".into(), text(first));
    values.insert("contact.first_name".into(), text(first));
    values.insert("contact.last_name".into(), text(last));
    values.insert("contact.full_name".into(), text(lead.contact_name.trim()));
    values.insert("contact.email".into(), optional_text(lead.email.as_deref()));
    values.insert("contact.phone".into(), optional_text(lead.phone.as_deref()));
    values
}

/// Format an amount as euros with Catalan separators: `1.234,56 €`.
pub fn format_eur(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let decimals = cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped},{decimals:02} €")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
