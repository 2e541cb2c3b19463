//! `{{namespace.key}}` placeholder extraction and substitution.
//!
//! The delimiter pair `{{` / `}}` is a storage contract: authored resource
//! content already relies on it, so the token syntax must not change.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Token syntax
// ---------------------------------------------------------------------------

/// Regex pattern matching `{{ key }}` tokens. The key is captured untrimmed.
pub const TOKEN_PATTERN: &str = r"\{\{([^{}]*)\}\}";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("valid regex"));

/// Merged lookup table from placeholder key to value.
pub type ResolvedValues = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

/// Closed registry of placeholder namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderNamespace {
    System,
    Company,
    Contact,
    Custom,
}

impl PlaceholderNamespace {
    pub const ALL: [PlaceholderNamespace; 4] = [
        PlaceholderNamespace::System,
        PlaceholderNamespace::Company,
        PlaceholderNamespace::Contact,
        PlaceholderNamespace::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Company => "company",
            Self::Contact => "contact",
            Self::Custom => "custom",
        }
    }

    /// Resolve the namespace of a dotted key (`company.name` -> `Company`).
    ///
    /// Returns `None` when the prefix is not a registered namespace.
    pub fn of_key(key: &str) -> Option<Self> {
        let prefix = key.split('.').next().unwrap_or_default();
        Self::ALL.into_iter().find(|ns| ns.as_str() == prefix)
    }
}

/// Namespace prefix of a key, for diagnostics.
pub fn namespace_prefix(key: &str) -> &str {
    key.split('.').next().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every placeholder key in `content`, in order of appearance.
///
/// Keys are trimmed. Repeated tokens are returned once per occurrence.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(content)
        .map(|cap| cap[1].trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Result of running content through the substitution engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPreview {
    pub original_content: String,
    pub processed_content: String,
    /// Keys replaced with a value, first occurrence order, no repeats.
    pub placeholders_used: Vec<String>,
    /// Keys replaced with the `[KEY]` fallback, first occurrence order, no repeats.
    pub missing_placeholders: Vec<String>,
    pub warnings: Vec<String>,
}

/// Fallback text written in place of an unresolved key.
pub fn missing_fallback(key: &str) -> String {
    format!("[{}]", key.to_uppercase())
}

/// Default stringification of a resolved value.
///
/// `null` and the empty string count as no value at all.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Replace every token in `content` using `values`.
///
/// Resolved tokens become the stringified value; everything else becomes
/// `[KEY]` and is reported in `missing_placeholders` with one warning per key.
/// Tokens outside the namespace registry get an extra warning.
///
/// Single pass: substituted values are never re-scanned for tokens.
pub fn process(content: &str, values: &ResolvedValues) -> ContentPreview {
    let mut used: Vec<String> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut unknown_namespaces: Vec<String> = Vec::new();

    let processed = TOKEN_RE.replace_all(content, |caps: &Captures| {
        let key = caps[1].trim();
        if key.is_empty() {
            return caps[0].to_string();
        }

        if PlaceholderNamespace::of_key(key).is_none()
            && !unknown_namespaces.iter().any(|k| k == key)
        {
            unknown_namespaces.push(key.to_string());
            warnings.push(format!(
                "Placeholder '{key}' uses unknown namespace '{}'",
                namespace_prefix(key)
            ));
        }

        match values.get(key).and_then(value_to_text) {
            Some(text) => {
                if !used.iter().any(|k| k == key) {
                    used.push(key.to_string());
                }
                text
            }
            None => {
                let fallback = missing_fallback(key);
                if !missing.iter().any(|k| k == key) {
                    missing.push(key.to_string());
                    warnings.push(format!("No value for placeholder '{key}', using {fallback}"));
                }
                fallback
            }
        }
    });

    ContentPreview {
        original_content: content.to_string(),
        processed_content: processed.into_owned(),
        placeholders_used: used,
        missing_placeholders: missing,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
