//! Filter tree node types
//!
//! Ordered nodes tagged by `Type`, mirroring the JSON handed to the external
//! Sieve renderer. Top-level nodes are a closed set: an unknown tag fails to
//! deserialize. Tests and actions keep a catch-all `Unsupported` variant so the
//! decompiler can report them as unsupported rather than malformed.

use crate::TextValue;
use serde::{Deserialize, Serialize};

/// The ordered node sequence.
pub type FilterTree = Vec<Node>;

// ============================================================================
// TOP-LEVEL NODES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum Node {
    Require(RequireNode),
    If(IfNode),
    Comment(CommentNode),
    Set(SetNode),
}

/// `require [..]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireNode {
    #[serde(rename = "List")]
    pub list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(rename = "Text")]
    pub text: String,
}

/// `set "name" "value"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNode {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Flags", default)]
    pub flags: Vec<String>,
}

/// `if <tests> { <then> }`. Both halves are optional on input; only an `If`
/// carrying tests and a `Then` list can be a filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfNode {
    #[serde(rename = "If", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<IfCondition>,
    #[serde(rename = "Then", default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Vec<Action>>,
    #[serde(rename = "Else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<serde_json::Value>,
}

impl IfNode {
    pub fn new(kind: TestListKind, tests: Vec<Test>, then: Vec<Action>) -> Self {
        Self {
            condition: Some(IfCondition {
                tests: Some(tests),
                kind,
            }),
            then: Some(then),
            otherwise: None,
        }
    }

    /// Tests and actions, when both are present.
    pub fn rule_parts(&self) -> Option<(TestListKind, &[Test], &[Action])> {
        let condition = self.condition.as_ref()?;
        let tests = condition.tests.as_deref()?;
        let then = self.then.as_deref()?;
        Some((condition.kind, tests, then))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfCondition {
    #[serde(rename = "Tests", default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<Test>>,
    #[serde(rename = "Type")]
    pub kind: TestListKind,
}

/// Boolean combinator over a test list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestListKind {
    AllOf,
    AnyOf,
}

// ============================================================================
// TESTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum Test {
    Header(HeaderTest),
    Address(AddressTest),
    Exists(ExistsTest),
    Not(NotTest),
    Environment(EnvironmentTest),
    SpamTest(SpamScoreTest),
    /// Any test kind this format does not model.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTest {
    #[serde(rename = "Headers")]
    pub headers: Vec<String>,
    #[serde(rename = "Keys")]
    pub keys: Vec<TextValue>,
    #[serde(rename = "Match")]
    pub match_spec: MatchSpec,
    #[serde(rename = "Format", default)]
    pub format: Option<FormatSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressTest {
    #[serde(rename = "Headers")]
    pub headers: Vec<String>,
    #[serde(rename = "Keys")]
    pub keys: Vec<TextValue>,
    #[serde(rename = "Match")]
    pub match_spec: MatchSpec,
    #[serde(rename = "Format", default)]
    pub format: Option<FormatSpec>,
    #[serde(rename = "AddressPart", default)]
    pub address_part: Option<AddressPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsTest {
    #[serde(rename = "Headers")]
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotTest {
    #[serde(rename = "Test")]
    pub test: Box<Test>,
}

/// `environment :matches "<name>" "*"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Keys")]
    pub keys: Vec<TextValue>,
    #[serde(rename = "Format", default)]
    pub format: Option<FormatSpec>,
    #[serde(rename = "Match")]
    pub match_spec: MatchSpec,
}

/// `spamtest :value "ge" :comparator "i;ascii-numeric" "${1}"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamScoreTest {
    #[serde(rename = "Value")]
    pub value: TextValue,
    #[serde(rename = "Flags", default)]
    pub flags: Vec<String>,
    #[serde(rename = "Format", default)]
    pub format: Option<FormatSpec>,
    #[serde(rename = "Match")]
    pub match_spec: RelationalMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpec {
    #[serde(rename = "Type")]
    pub kind: MatchType,
}

/// Sieve match types the simple model can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Is,
    Contains,
    Matches,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationalMatch {
    #[serde(rename = "Comparator")]
    pub comparator: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPart {
    #[serde(rename = "Type")]
    pub kind: String,
}

// ============================================================================
// ACTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum Action {
    FileInto(FileIntoAction),
    AddFlag(FlagAction),
    Keep,
    Discard,
    /// Older V1 trees spell the tag `Vacation\Vacation`.
    #[serde(alias = "Vacation\\Vacation")]
    Vacation(VacationAction),
    Return,
    Stop,
    Reject,
    Redirect,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIntoAction {
    #[serde(rename = "Name")]
    pub name: TextValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagAction {
    #[serde(rename = "Flags")]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationAction {
    #[serde(rename = "Message")]
    pub message: TextValue,
    #[serde(
        rename = "Args",
        default,
        deserialize_with = "vacation_args",
        skip_serializing_if = "Option::is_none"
    )]
    pub args: Option<VacationArgs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationArgs {
    #[serde(rename = "MIMEType")]
    pub mime_type: String,
}

/// Backends also emit `"Args": []` for a vacation with no options.
fn vacation_args<'de, D>(deserializer: D) -> Result<Option<VacationArgs>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ArgsShape {
        Args(VacationArgs),
        Empty(Vec<serde::de::IgnoredAny>),
    }

    Ok(match Option::<ArgsShape>::deserialize(deserializer)? {
        Some(ArgsShape::Args(args)) => Some(args),
        Some(ArgsShape::Empty(_)) | None => None,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_top_level_node_is_rejected() {
        let raw = json!([{ "Type": "Foreverypart" }]);
        assert!(serde_json::from_value::<FilterTree>(raw).is_err());
    }

    #[test]
    fn test_unknown_action_maps_to_unsupported() {
        let then: Vec<Action> = serde_json::from_value(json!([
            { "Type": "Keep" },
            { "Type": "Ereject", "Message": "no" },
            { "Type": "Reject", "Message": "no" }
        ]))
        .unwrap();
        assert_eq!(then, vec![Action::Keep, Action::Unsupported, Action::Reject]);
    }

    #[test]
    fn test_legacy_vacation_tag() {
        let action: Action = serde_json::from_value(json!({
            "Type": "Vacation\\Vacation",
            "Message": "away",
            "Args": { "MIMEType": "text/html" }
        }))
        .unwrap();
        assert!(matches!(action, Action::Vacation(_)));
        let back = serde_json::to_value(&action).unwrap();
        assert_eq!(back["Type"], "Vacation");
    }

    #[test]
    fn test_vacation_args_accepts_empty_list_and_absence() {
        for args in [Some(json!([])), Some(json!(null)), None] {
            let mut raw = json!({ "Type": "Vacation", "Message": "away" });
            if let Some(args) = args {
                raw["Args"] = args;
            }
            match serde_json::from_value::<Action>(raw).unwrap() {
                Action::Vacation(vacation) => assert_eq!(vacation.args, None),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_negated_header_test_round_trips() {
        let raw = json!({
            "Test": {
                "Headers": ["Subject"],
                "Keys": ["Order"],
                "Match": { "Type": "Contains" },
                "Format": { "Type": "UnicodeCaseMap" },
                "Type": "Header"
            },
            "Type": "Not"
        });
        let test: Test = serde_json::from_value(raw.clone()).unwrap();
        match &test {
            Test::Not(not) => assert!(matches!(*not.test, Test::Header(_))),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(serde_json::to_value(&test).unwrap(), raw);
    }

    #[test]
    fn test_if_node_without_then_is_not_a_rule() {
        let node: Node = serde_json::from_value(json!({
            "If": { "Tests": [], "Type": "AllOf" },
            "Type": "If"
        }))
        .unwrap();
        match node {
            Node::If(if_node) => assert!(if_node.rule_parts().is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
