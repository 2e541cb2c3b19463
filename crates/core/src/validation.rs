//! Placeholder validators.
//!
//! Two independent checks live here and must not be conflated:
//! - authoring completeness ([`validate_required_placeholders`]): does the
//!   template text contain every required token?
//! - value validity ([`validate_placeholder_value`]): does one supplied value
//!   satisfy a declared placeholder's constraints?
//!
//! Runtime resolution (was there a value at substitution time?) is reported
//! by [`crate::placeholders::process`] instead.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::placeholders::{extract_placeholders, namespace_prefix, PlaceholderNamespace};
use crate::resource::Placeholder;

// ---------------------------------------------------------------------------
// Authoring completeness
// ---------------------------------------------------------------------------

/// Outcome of [`validate_required_placeholders`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredPlaceholderCheck {
    pub valid: bool,
    pub missing: Vec<String>,
}

/// List required declared keys that never appear as a token in `content`.
pub fn validate_required_placeholders(
    content: &str,
    declared: &[Placeholder],
) -> RequiredPlaceholderCheck {
    let present = extract_placeholders(content);
    let missing: Vec<String> = declared
        .iter()
        .filter(|p| p.required && !present.iter().any(|k| k == &p.key))
        .map(|p| p.key.clone())
        .collect();
    RequiredPlaceholderCheck {
        valid: missing.is_empty(),
        missing,
    }
}

// ---------------------------------------------------------------------------
// Declared placeholder metadata
// ---------------------------------------------------------------------------

/// Reject declared placeholders with an empty key, a key outside the
/// namespace registry, a duplicate key, inverted length bounds or a pattern
/// that does not compile.
pub fn validate_declared_placeholders(declared: &[Placeholder]) -> Result<(), CoreError> {
    let mut seen: Vec<&str> = Vec::with_capacity(declared.len());
    for placeholder in declared {
        let key = placeholder.key.trim();
        if key.is_empty() || key != placeholder.key {
            return Err(CoreError::Validation(format!(
                "Placeholder key '{}' must be non-empty without surrounding whitespace",
                placeholder.key
            )));
        }
        if PlaceholderNamespace::of_key(key).is_none() {
            return Err(CoreError::Validation(format!(
                "Placeholder '{key}' uses unknown namespace '{}'. Must be one of: system, company, contact, custom",
                namespace_prefix(key)
            )));
        }
        if seen.contains(&key) {
            return Err(CoreError::Validation(format!(
                "Placeholder '{key}' is declared more than once"
            )));
        }
        seen.push(key);

        if let Some(rules) = &placeholder.validation {
            if let (Some(min), Some(max)) = (rules.min_length, rules.max_length) {
                if min > max {
                    return Err(CoreError::Validation(format!(
                        "Placeholder '{key}' has min_length ({min}) greater than max_length ({max})"
                    )));
                }
            }
            if let Some(pattern) = &rules.pattern {
                Regex::new(pattern).map_err(|e| {
                    CoreError::Validation(format!(
                        "Placeholder '{key}' has an invalid pattern: {e}"
                    ))
                })?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Single value
// ---------------------------------------------------------------------------

/// Outcome of validating one value against one declared placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ValueValidation {
    Valid,
    Invalid { message: String },
}

impl ValueValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    fn invalid(message: String) -> Self {
        Self::Invalid { message }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validate one value. The first failing rule wins.
///
/// Order: required, pattern, min length, max length. Empty optional values are
/// valid without running the other rules. Lengths count characters.
pub fn validate_placeholder_value(value: &Value, placeholder: &Placeholder) -> ValueValidation {
    let text = stringify(value);

    if text.is_empty() {
        return if placeholder.required {
            ValueValidation::invalid(format!("{} is required", placeholder.label))
        } else {
            ValueValidation::Valid
        };
    }

    let Some(rules) = &placeholder.validation else {
        return ValueValidation::Valid;
    };

    if let Some(pattern) = &rules.pattern {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(&text) => {}
            Ok(_) => {
                return ValueValidation::invalid(format!(
                    "{} does not have a valid format",
                    placeholder.label
                ))
            }
            Err(_) => {
                return ValueValidation::invalid(format!(
                    "{} has an invalid validation pattern",
                    placeholder.label
                ))
            }
        }
    }

    let len = text.chars().count();
    if let Some(min) = rules.min_length {
        if len < min {
            return ValueValidation::invalid(format!(
                "{} must be at least {min} characters",
                placeholder.label
            ));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max {
            return ValueValidation::invalid(format!(
                "{} must be at most {max} characters",
                placeholder.label
            ));
        }
    }

    ValueValidation::Valid
}

/// Validate caller values against every declared placeholder, keyed by
/// placeholder key. Declared keys without a supplied value are validated as
/// empty.
pub fn validate_placeholder_values(
    values: &BTreeMap<String, Value>,
    declared: &[Placeholder],
) -> BTreeMap<String, ValueValidation> {
    declared
        .iter()
        .map(|p| {
            let value = values.get(&p.key).unwrap_or(&Value::Null);
            (p.key.clone(), validate_placeholder_value(value, p))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{PlaceholderKind, PlaceholderRules};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn placeholder(key: &str, required: bool, rules: Option<PlaceholderRules>) -> Placeholder {
        Placeholder {
            key: key.to_string(),
            label: "Camp".to_string(),
            kind: PlaceholderKind::Custom,
            required,
            validation: rules,
        }
    }

    // -- validate_required_placeholders --

    #[test]
    fn required_key_absent_from_content_fails() {
        let declared = vec![placeholder("contact.name", true, None)];
        let check = validate_required_placeholders("Hola {{company.name}}", &declared);
        assert!(!check.valid);
        assert_eq!(check.missing, vec!["contact.name"]);
    }

    #[test]
    fn required_key_present_with_whitespace_passes() {
        let declared = vec![placeholder("contact.name", true, None)];
        let check = validate_required_placeholders("Hola {{ contact.name }}", &declared);
        assert!(check.valid);
        assert!(check.missing.is_empty());
    }

    #[test]
    fn optional_keys_are_not_required() {
        let declared = vec![placeholder("custom.note", false, None)];
        assert!(validate_required_placeholders("", &declared).valid);
    }

    // -- validate_declared_placeholders --

    #[test]
    fn declared_unknown_namespace_rejected() {
        let err = validate_declared_placeholders(&[placeholder("lead.name", false, None)])
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("unknown namespace 'lead'"));
    }

    #[test]
    fn declared_duplicate_rejected() {
        let declared = vec![
            placeholder("custom.a", false, None),
            placeholder("custom.a", true, None),
        ];
        assert!(validate_declared_placeholders(&declared).is_err());
    }

    #[test]
    fn declared_bad_pattern_rejected() {
        let rules = PlaceholderRules {
            pattern: Some("([a-z".into()),
            ..Default::default()
        };
        assert!(validate_declared_placeholders(&[placeholder("custom.a", false, Some(rules))]).is_err());
    }

    #[test]
    fn declared_inverted_bounds_rejected() {
        let rules = PlaceholderRules {
            min_length: Some(10),
            max_length: Some(2),
            ..Default::default()
        };
        assert!(validate_declared_placeholders(&[placeholder("custom.a", false, Some(rules))]).is_err());
    }

    #[test]
    fn declared_valid_list_passes() {
        let declared = vec![
            placeholder("company.name", true, None),
            placeholder("system.date", false, None),
        ];
        assert!(validate_declared_placeholders(&declared).is_ok());
    }

    // -- validate_placeholder_value --

    #[test]
    fn required_empty_value_rejected() {
        let p = placeholder("custom.a", true, None);
        assert_matches!(
            validate_placeholder_value(&json!(""), &p),
            ValueValidation::Invalid { message } if message == "Camp is required"
        );
        assert!(!validate_placeholder_value(&Value::Null, &p).is_valid());
    }

    #[test]
    fn optional_empty_value_accepted() {
        let rules = PlaceholderRules {
            min_length: Some(3),
            ..Default::default()
        };
        let p = placeholder("custom.a", false, Some(rules));
        assert!(validate_placeholder_value(&json!(""), &p).is_valid());
    }

    #[test]
    fn pattern_mismatch_rejected() {
        let rules = PlaceholderRules {
            pattern: Some(r"^\d{5}$".into()),
            ..Default::default()
        };
        let p = placeholder("custom.cp", true, Some(rules));
        assert!(validate_placeholder_value(&json!("08001"), &p).is_valid());
        assert_matches!(
            validate_placeholder_value(&json!("8001"), &p),
            ValueValidation::Invalid { message } if message.contains("valid format")
        );
    }

    #[test]
    fn numbers_are_stringified_before_pattern() {
        let rules = PlaceholderRules {
            pattern: Some(r"^\d+$".into()),
            ..Default::default()
        };
        let p = placeholder("custom.qty", true, Some(rules));
        assert!(validate_placeholder_value(&json!(12), &p).is_valid());
    }

    #[test]
    fn length_bounds_checked() {
        let rules = PlaceholderRules {
            min_length: Some(2),
            max_length: Some(4),
            ..Default::default()
        };
        let p = placeholder("custom.a", false, Some(rules));
        assert_matches!(
            validate_placeholder_value(&json!("a"), &p),
            ValueValidation::Invalid { message } if message.contains("at least 2")
        );
        assert_matches!(
            validate_placeholder_value(&json!("abcde"), &p),
            ValueValidation::Invalid { message } if message.contains("at most 4")
        );
        assert!(validate_placeholder_value(&json!("àèìò"), &p).is_valid());
    }

    #[test]
    fn first_failing_rule_wins() {
        let rules = PlaceholderRules {
            pattern: Some("^[0-9]+$".into()),
            min_length: Some(5),
            ..Default::default()
        };
        let p = placeholder("custom.a", false, Some(rules));
        assert_matches!(
            validate_placeholder_value(&json!("ab"), &p),
            ValueValidation::Invalid { message } if message.contains("valid format")
        );
    }

    // -- validate_placeholder_values --

    #[test]
    fn validates_every_declared_key() {
        let declared = vec![
            placeholder("custom.a", true, None),
            placeholder("custom.b", false, None),
        ];
        let mut values = BTreeMap::new();
        values.insert("custom.b".to_string(), json!("x"));
        let results = validate_placeholder_values(&values, &declared);
        assert_eq!(results.len(), 2);
        assert!(!results["custom.a"].is_valid());
        assert!(results["custom.b"].is_valid());
    }
}
