//! Simple filter model
//!
//! The flat, UI-facing shape. Field names match the JSON the UI exchanges.
//! Tokens stay as strings here; the compiler validates them.

use crate::TextValue;
use serde::{Deserialize, Serialize};

/// A token paired with its human label, e.g. `{value: "all", label: "All"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledValue {
    pub value: String,
    pub label: String,
}

impl LabeledValue {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The complete simple filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleFilter {
    /// `all` or `any`
    pub operator: LabeledValue,
    pub conditions: Vec<Condition>,
    pub actions: Actions,
}

/// One condition. `comparator.value` may carry a `!` prefix for negation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Condition {
    /// `sender`, `recipient`, `subject` or `attachments`
    #[serde(rename = "Type")]
    pub kind: LabeledValue,
    pub comparator: LabeledValue,
    pub values: Vec<TextValue>,
}

/// The fixed action bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Actions {
    /// Destinations; `null` entries are skipped by the compiler.
    pub file_into: Vec<Option<TextValue>>,
    pub mark: Mark,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacation: Option<TextValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mark {
    pub read: bool,
    pub starred: bool,
}

impl Mark {
    pub fn any(&self) -> bool {
        self.read || self.starred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_filter_json_shape() {
        let raw = json!({
            "Operator": { "label": "All", "value": "all" },
            "Conditions": [{
                "Type": { "value": "subject", "label": "Subject" },
                "Comparator": { "value": "!contains", "label": "does not contain" },
                "Values": ["Order", { "Type": "VariableString", "Value": "${x}" }]
            }],
            "Actions": {
                "FileInto": ["inbox", null],
                "Mark": { "Read": true, "Starred": false }
            }
        });

        let simple: SimpleFilter = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(simple.operator.value, "all");
        assert_eq!(simple.conditions[0].kind.value, "subject");
        assert_eq!(simple.conditions[0].values.len(), 2);
        assert_eq!(simple.actions.file_into[1], None);
        assert!(simple.actions.vacation.is_none());

        assert_eq!(serde_json::to_value(&simple).unwrap(), raw);
    }

    #[test]
    fn test_missing_values_is_rejected() {
        let raw = json!({
            "Type": { "value": "attachments", "label": "Attachments" },
            "Comparator": { "value": "contains", "label": "contains" }
        });
        assert!(serde_json::from_value::<Condition>(raw).is_err());
    }

    #[test]
    fn test_mark_any() {
        assert!(!Mark::default().any());
        assert!(Mark { read: false, starred: true }.any());
    }
}
