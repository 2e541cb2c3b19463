//! Lead records used as the data source for placeholder resolution.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// A prospective customer. Owned by the CRM, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub estimated_revenue: Option<f64>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Split a full name at its first whitespace run into `(first, rest)`.
///
/// `rest` is empty when the name has a single word.
pub fn split_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    }
}
