//! Canned subtrees and fixed tokens of the filter tree.

use sievekit_core::{
    Action, CommentNode, EnvironmentTest, ExistsTest, FormatSpec, IfNode, MatchSpec, MatchType,
    Node, RelationalMatch, SetNode, SieveConfig, SpamScoreTest, Test, TestListKind,
    TextValue, VariableToken,
};

// ============================================================================
// EXTENSIONS
// ============================================================================

/// Extensions every filter needs.
pub const MANDATORY_EXTENSIONS: [&str; 2] = ["fileinto", "imap4flags"];

/// Fixed bundle heading every V2 tree.
pub const V2_EXTENSION_BUNDLE: [&str; 6] = [
    "include",
    "environment",
    "variables",
    "relational",
    "comparator-i;ascii-numeric",
    "spamtest",
];

pub const VACATION_EXTENSION: &str = "vacation";
pub const VARIABLES_EXTENSION: &str = "variables";

// ============================================================================
// HEADERS, FLAGS, FORMATS
// ============================================================================

pub const SENDER_HEADERS: [&str; 1] = ["From"];
pub const RECIPIENT_HEADERS: [&str; 3] = ["To", "Cc", "Bcc"];
pub const SUBJECT_HEADERS: [&str; 1] = ["Subject"];
pub const ATTACHMENT_HEADER: &str = "X-Attached";

pub const SEEN_FLAG: &str = "\\Seen";
pub const FLAGGED_FLAG: &str = "\\Flagged";

/// Destination a `discard` lands in.
pub const TRASH: &str = "trash";

pub const UNICODE_CASE_MAP: &str = "UnicodeCaseMap";
pub const ADDRESS_PART_ALL: &str = "All";

pub fn unicode_case_map() -> Option<FormatSpec> {
    Some(FormatSpec {
        kind: UNICODE_CASE_MAP.to_string(),
    })
}

// ============================================================================
// DOLLAR DECLARATION
// ============================================================================

pub const DOLLAR_NAME: &str = "dollar";
pub const DOLLAR_VALUE: &str = "$";

/// `set "dollar" "$"`, referenced by every escaped `${...}`.
pub fn dollar_declaration() -> Node {
    Node::Set(SetNode {
        name: DOLLAR_NAME.to_string(),
        value: DOLLAR_VALUE.to_string(),
        flags: Vec::new(),
    })
}

pub fn is_dollar_declaration(node: &SetNode) -> bool {
    node.name == DOLLAR_NAME && node.value == DOLLAR_VALUE
}

// ============================================================================
// ATTACHMENT TEST
// ============================================================================

/// `exists "X-Attached"`
pub fn attachment_test() -> Test {
    Test::Exists(ExistsTest {
        headers: vec![ATTACHMENT_HEADER.to_string()],
    })
}

// ============================================================================
// SPAM GUARD
// ============================================================================

pub const SPAM_GUARD_COMMENT: &str = "# Generated: Do not run this script on spam messages";

/// Marker comment plus an early `return` when the spam score reaches the
/// account threshold.
pub fn spam_guard(config: &SieveConfig) -> [Node; 2] {
    let threshold = Test::Environment(EnvironmentTest {
        name: config.spam_threshold_env.clone(),
        keys: vec![TextValue::from("*")],
        format: None,
        match_spec: MatchSpec {
            kind: MatchType::Matches,
        },
    });
    let score = Test::SpamTest(SpamScoreTest {
        value: TextValue::Variable(VariableToken::new("${1}")),
        flags: Vec::new(),
        format: Some(FormatSpec {
            kind: "ASCIINumeric".to_string(),
        }),
        match_spec: RelationalMatch {
            comparator: "ge".to_string(),
            kind: "GreaterEqualsValue".to_string(),
        },
    });

    [
        Node::Comment(CommentNode {
            text: SPAM_GUARD_COMMENT.to_string(),
        }),
        Node::If(IfNode::new(
            TestListKind::AllOf,
            vec![threshold, score],
            vec![Action::Return],
        )),
    ]
}

/// Whether an `If` node is a spam guard rather than a filter rule.
pub fn is_spam_guard(node: &IfNode) -> bool {
    match node.rule_parts() {
        Some((_, tests, then)) => {
            matches!(then, [Action::Return])
                && tests.iter().any(|t| matches!(t, Test::SpamTest(_)))
                && tests
                    .iter()
                    .all(|t| matches!(t, Test::SpamTest(_) | Test::Environment(_)))
        }
        None => false,
    }
}
