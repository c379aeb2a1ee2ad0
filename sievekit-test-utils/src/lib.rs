//! SIEVEKIT Test Utilities
//!
//! Shared test infrastructure for the sievekit workspace:
//! - Proptest generators for simple filters
//! - JSON fixtures for the canonical filters and trees
//! - Assertions over `SieveResult`

pub use sievekit_core::{
    Actions, Condition, FilterTree, LabeledValue, Mark, Node, SieveError, SieveResult,
    SimpleFilter, TextValue, Version,
};

/// Human label of a simple-model token.
///
/// Kept local so this crate only needs the data types.
pub fn label(token: &str) -> &'static str {
    match token {
        "all" => "All",
        "any" => "Any",
        "subject" => "Subject",
        "sender" => "Sender",
        "recipient" => "Recipient",
        "attachments" => "Attachments",
        "contains" => "contains",
        "!contains" => "does not contain",
        "is" => "is exactly",
        "!is" => "is not",
        "matches" => "matches",
        "!matches" => "does not match",
        "starts" => "begins with",
        "!starts" => "does not begin with",
        "ends" => "ends with",
        "!ends" => "does not end with",
        other => panic!("no label for {}", other),
    }
}

pub fn labeled(token: &str) -> LabeledValue {
    LabeledValue::new(token, label(token))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for simple filters.
    //!
    //! Generated filters are canonical: the compiler drops nothing from them,
    //! so a lossless translation must give them back unchanged.

    use super::*;
    use proptest::prelude::*;

    pub const POSITIONAL_TYPES: [&str; 3] = ["sender", "recipient", "subject"];
    pub const PLAIN_COMPARATORS: [&str; 6] =
        ["contains", "!contains", "is", "!is", "matches", "!matches"];
    pub const AFFIXED_COMPARATORS: [&str; 4] = ["starts", "!starts", "ends", "!ends"];

    /// Text mixing glob characters, backslashes and `${..}` syntax.
    pub fn arb_tricky_text() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => r"[a-zA-Z0-9 *?\\${}._@-]{0,10}",
            1 => r"[a-z]{0,3}\$\{[a-z0-9_.]{1,6}\}[a-z]{0,3}",
            1 => r"\*?[a-z\\]{0,4}\*?",
        ]
    }

    /// Non-empty text; empty destinations and messages are dropped on compile.
    pub fn arb_nonempty_text() -> impl Strategy<Value = String> {
        arb_tricky_text().prop_filter("non-empty", |s| !s.is_empty())
    }

    /// Distinct values; duplicates collapse on compile.
    pub fn arb_values() -> impl Strategy<Value = Vec<TextValue>> {
        prop::collection::btree_set(arb_tricky_text(), 0..4)
            .prop_map(|set| set.into_iter().map(TextValue::Plain).collect())
    }

    fn arb_positional(comparators: &'static [&'static str]) -> impl Strategy<Value = Condition> {
        (
            prop::sample::select(POSITIONAL_TYPES.to_vec()),
            prop::sample::select(comparators),
            arb_values(),
        )
            .prop_map(|(kind, comparator, values)| Condition {
                kind: labeled(kind),
                comparator: labeled(comparator),
                values,
            })
    }

    /// Attachment conditions only round-trip as `contains` with no values.
    pub fn arb_attachment_condition() -> impl Strategy<Value = Condition> {
        prop::sample::select(vec!["contains", "!contains"]).prop_map(|comparator| Condition {
            kind: labeled("attachments"),
            comparator: labeled(comparator),
            values: Vec::new(),
        })
    }

    /// Conditions without `starts`/`ends`.
    pub fn arb_plain_condition() -> impl Strategy<Value = Condition> {
        prop_oneof![
            4 => arb_positional(&PLAIN_COMPARATORS),
            1 => arb_attachment_condition(),
        ]
    }

    /// Any condition, affixed comparators included.
    pub fn arb_condition() -> impl Strategy<Value = Condition> {
        prop_oneof![
            2 => arb_positional(&PLAIN_COMPARATORS),
            2 => arb_positional(&AFFIXED_COMPARATORS),
            1 => arb_attachment_condition(),
        ]
    }

    pub fn arb_mark() -> impl Strategy<Value = Mark> {
        (any::<bool>(), any::<bool>()).prop_map(|(read, starred)| Mark { read, starred })
    }

    pub fn arb_actions() -> impl Strategy<Value = Actions> {
        (
            prop::collection::vec(arb_nonempty_text(), 0..3),
            arb_mark(),
            prop::option::of(arb_nonempty_text()),
        )
            .prop_map(|(file_into, mark, vacation)| Actions {
                file_into: file_into
                    .into_iter()
                    .map(|f| Some(TextValue::Plain(f)))
                    .collect(),
                mark,
                vacation: vacation.map(TextValue::Plain),
            })
    }

    fn arb_filter_with(
        condition: impl Strategy<Value = Condition>,
    ) -> impl Strategy<Value = SimpleFilter> {
        (
            prop::sample::select(vec!["all", "any"]),
            prop::collection::vec(condition, 0..5),
            arb_actions(),
        )
            .prop_map(|(operator, conditions, actions)| SimpleFilter {
                operator: labeled(operator),
                conditions,
                actions,
            })
    }

    /// Canonical filter over every comparator.
    pub fn arb_simple_filter() -> impl Strategy<Value = SimpleFilter> {
        arb_filter_with(arb_condition())
    }

    /// Canonical filter that survives V1 unchanged.
    pub fn arb_plain_simple_filter() -> impl Strategy<Value = SimpleFilter> {
        arb_filter_with(arb_plain_condition())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Canonical simple filters and filter trees as JSON.

    use super::*;
    use serde_json::{json, Value};

    fn bundle() -> Value {
        json!({
            "List": [
                "include",
                "environment",
                "variables",
                "relational",
                "comparator-i;ascii-numeric",
                "spamtest"
            ],
            "Type": "Require"
        })
    }

    fn spam_comment() -> Value {
        json!({
            "Text": "# Generated: Do not run this script on spam messages",
            "Type": "Comment"
        })
    }

    fn spam_guard() -> Value {
        json!({
            "If": {
                "Tests": [
                    {
                        "Name": "vnd.proton.spam-threshold",
                        "Keys": ["*"],
                        "Format": null,
                        "Match": { "Type": "Matches" },
                        "Type": "Environment"
                    },
                    {
                        "Value": { "Value": "${1}", "Type": "VariableString" },
                        "Flags": [],
                        "Format": { "Type": "ASCIINumeric" },
                        "Match": { "Comparator": "ge", "Type": "GreaterEqualsValue" },
                        "Type": "SpamTest"
                    }
                ],
                "Type": "AllOf"
            },
            "Then": [{ "Type": "Return" }],
            "Type": "If"
        })
    }

    fn dollar() -> Value {
        json!({ "Name": "dollar", "Value": "$", "Flags": [], "Type": "Set" })
    }

    fn subject_test(keys: Value, match_type: &str) -> Value {
        json!({
            "Headers": ["Subject"],
            "Keys": keys,
            "Match": { "Type": match_type },
            "Format": { "Type": "UnicodeCaseMap" },
            "Type": "Header"
        })
    }

    fn condition(kind: &str, comparator: &str, values: Value) -> Value {
        json!({
            "Type": { "value": kind, "label": label(kind) },
            "Comparator": { "value": comparator, "label": label(comparator) },
            "Values": values
        })
    }

    fn operator(token: &str) -> Value {
        json!({ "value": token, "label": label(token) })
    }

    // === Example A: subject contains, V1 ===

    pub fn example_a_simple() -> Value {
        json!({
            "Operator": operator("all"),
            "Conditions": [condition("subject", "contains", json!(["Order"]))],
            "Actions": {
                "FileInto": ["important", "Folder"],
                "Mark": { "Read": true, "Starred": false }
            }
        })
    }

    pub fn example_a_tree() -> Value {
        json!([
            { "List": ["fileinto", "imap4flags"], "Type": "Require" },
            {
                "If": {
                    "Tests": [subject_test(json!(["Order"]), "Contains")],
                    "Type": "AllOf"
                },
                "Then": [
                    { "Name": "important", "Type": "FileInto" },
                    { "Name": "Folder", "Type": "FileInto" },
                    { "Flags": ["\\Seen"], "Type": "AddFlag" },
                    { "Type": "Keep" }
                ],
                "Type": "If"
            }
        ])
    }

    // === Example B: starts / ends, V2 ===

    pub fn starts_ends_simple() -> Value {
        json!({
            "Operator": operator("all"),
            "Conditions": [
                condition("subject", "starts", json!(["starts with"])),
                condition("subject", "!ends", json!(["ends with"]))
            ],
            "Actions": {
                "FileInto": ["important", "Folder"],
                "Mark": { "Read": true, "Starred": false }
            }
        })
    }

    pub fn starts_ends_tree() -> Value {
        json!([
            bundle(),
            { "List": ["fileinto", "imap4flags"], "Type": "Require" },
            spam_comment(),
            spam_guard(),
            {
                "Text": "/**\r\n * @type and\r\n * @comparator starts\r\n * @comparator !ends\r\n */",
                "Type": "Comment"
            },
            {
                "If": {
                    "Tests": [
                        subject_test(json!(["starts with*"]), "Matches"),
                        {
                            "Test": subject_test(json!(["*ends with"]), "Matches"),
                            "Type": "Not"
                        }
                    ],
                    "Type": "AllOf"
                },
                "Then": [
                    { "Name": "important", "Type": "FileInto" },
                    { "Name": "Folder", "Type": "FileInto" },
                    { "Flags": ["\\Seen"], "Type": "AddFlag" },
                    { "Type": "Keep" }
                ],
                "Type": "If"
            }
        ])
    }

    /// The V1 rendering of the same intent, as `matches` globs.
    pub fn v1_matches_simple() -> Value {
        json!({
            "Operator": operator("all"),
            "Conditions": [
                condition("subject", "matches", json!(["starts with*"])),
                condition("subject", "!matches", json!(["*ends with"]))
            ],
            "Actions": {
                "FileInto": ["important", "Folder"],
                "Mark": { "Read": true, "Starred": false }
            }
        })
    }

    pub fn v1_matches_tree() -> Value {
        json!([
            { "List": ["fileinto", "imap4flags"], "Type": "Require" },
            {
                "If": {
                    "Tests": [
                        subject_test(json!(["starts with*"]), "Matches"),
                        {
                            "Test": subject_test(json!(["*ends with"]), "Matches"),
                            "Type": "Not"
                        }
                    ],
                    "Type": "AllOf"
                },
                "Then": [
                    { "Name": "important", "Type": "FileInto" },
                    { "Name": "Folder", "Type": "FileInto" },
                    { "Flags": ["\\Seen"], "Type": "AddFlag" },
                    { "Type": "Keep" }
                ],
                "Type": "If"
            }
        ])
    }

    // === Example C: attachments ===

    pub fn attachments_simple(comparator: &str) -> Value {
        json!({
            "Operator": operator("all"),
            "Conditions": [condition("attachments", comparator, json!([]))],
            "Actions": {
                "FileInto": ["inbox"],
                "Mark": { "Read": false, "Starred": false }
            }
        })
    }

    pub fn attachments_tree() -> Value {
        json!([
            bundle(),
            { "List": ["fileinto", "imap4flags"], "Type": "Require" },
            spam_comment(),
            spam_guard(),
            {
                "Text": "/**\r\n * @type and\r\n * @comparator default\r\n */",
                "Type": "Comment"
            },
            {
                "If": {
                    "Tests": [{ "Headers": ["X-Attached"], "Type": "Exists" }],
                    "Type": "AllOf"
                },
                "Then": [{ "Name": "inbox", "Type": "FileInto" }],
                "Type": "If"
            }
        ])
    }

    // === Example D: reject ===

    pub fn reject_tree() -> Value {
        json!([
            { "List": ["fileinto", "imap4flags", "reject"], "Type": "Require" },
            {
                "If": {
                    "Tests": [subject_test(json!(["spam"]), "Contains")],
                    "Type": "AllOf"
                },
                "Then": [{ "Message": "go away", "Type": "Reject" }],
                "Type": "If"
            }
        ])
    }

    // === Example E: vacation and escaped variables ===

    pub fn vacation_simple() -> Value {
        json!({
            "Operator": operator("all"),
            "Conditions": [condition("attachments", "contains", json!([]))],
            "Actions": {
                "FileInto": [],
                "Mark": { "Read": false, "Starred": false },
                "Vacation": "<div>Vacation test<br></div>"
            }
        })
    }

    pub fn vacation_tree() -> Value {
        json!([
            bundle(),
            { "List": ["fileinto", "imap4flags", "vacation"], "Type": "Require" },
            spam_comment(),
            spam_guard(),
            {
                "Text": "/**\r\n * @type and\r\n * @comparator default\r\n */",
                "Type": "Comment"
            },
            {
                "If": {
                    "Tests": [{ "Headers": ["X-Attached"], "Type": "Exists" }],
                    "Type": "AllOf"
                },
                "Then": [{
                    "Message": "<div>Vacation test<br></div>",
                    "Args": { "MIMEType": "text/html" },
                    "Type": "Vacation"
                }],
                "Type": "If"
            }
        ])
    }

    const VACATION_LITERAL: &str =
        "<div>Je mange une pomme, ${d3_so} pas ${déso} mais ${j'ai} faim pedro</div> ";
    const VACATION_ESCAPED: &str =
        "<div>Je mange une pomme, ${dollar}{d3_so} pas ${déso} mais ${j'ai} faim pedro</div> ";

    pub fn escape_variables_simple() -> Value {
        json!({
            "Operator": operator("any"),
            "Conditions": [
                condition("recipient", "ends", json!(["${frommail}", "${}", "${frommail} ${tomail}"]))
            ],
            "Actions": {
                "FileInto": ["archive", "polo", "${File}"],
                "Mark": { "Read": true, "Starred": true },
                "Vacation": VACATION_LITERAL
            }
        })
    }

    fn escape_variables_rule() -> Value {
        json!({
            "If": {
                "Tests": [{
                    "Headers": ["To", "Cc", "Bcc"],
                    "Keys": [
                        { "Type": "VariableString", "Value": "*${dollar}{frommail}" },
                        "*${}",
                        { "Type": "VariableString", "Value": "*${dollar}{frommail} ${dollar}{tomail}" }
                    ],
                    "Match": { "Type": "Matches" },
                    "Format": { "Type": "UnicodeCaseMap" },
                    "AddressPart": { "Type": "All" },
                    "Type": "Address"
                }],
                "Type": "AnyOf"
            },
            "Then": [
                { "Name": "archive", "Type": "FileInto" },
                { "Name": "polo", "Type": "FileInto" },
                {
                    "Name": { "Value": "${dollar}{File}", "Type": "VariableString" },
                    "Type": "FileInto"
                },
                { "Flags": ["\\Seen", "\\Flagged"], "Type": "AddFlag" },
                { "Type": "Keep" },
                {
                    "Message": { "Value": VACATION_ESCAPED, "Type": "VariableString" },
                    "Args": { "MIMEType": "text/html" },
                    "Type": "Vacation"
                }
            ],
            "Type": "If"
        })
    }

    /// Current V2 output for `escape_variables_simple`.
    pub fn escape_variables_tree() -> Value {
        json!([
            bundle(),
            { "List": ["fileinto", "imap4flags", "vacation"], "Type": "Require" },
            dollar(),
            spam_comment(),
            spam_guard(),
            {
                "Text": "/**\r\n * @type or\r\n * @comparator ends\r\n */",
                "Type": "Comment"
            },
            escape_variables_rule()
        ])
    }

    /// Older layout: no spam guard, smaller bundle, declaration after the requires.
    pub fn legacy_escape_variables_tree() -> Value {
        json!([
            {
                "List": ["include", "environment", "variables", "relational", "comparator-i;ascii-numeric"],
                "Type": "Require"
            },
            { "List": ["fileinto", "imap4flags", "vacation"], "Type": "Require" },
            dollar(),
            {
                "Text": "/**\r\n * @type or\r\n * @comparator ends\r\n */",
                "Type": "Comment"
            },
            escape_variables_rule()
        ])
    }

    // === Trees with no simple rendering ===

    /// Only the spam guard; there is no rule to lift.
    pub fn spamtest_only_tree() -> Value {
        json!([bundle(), { "List": ["fileinto", "imap4flags"], "Type": "Require" }, spam_guard()])
    }

    /// Two vacation rules built by hand around a date test.
    pub fn double_vacation_tree() -> Value {
        let rule = |address: &str, message: &str| {
            json!({
                "If": {
                    "Tests": [
                        {
                            "DateFormat": "date",
                            "Keys": ["2018-06-14"],
                            "Zone": { "Argument": "CET", "Type": "Zone" },
                            "Format": null,
                            "MatchOperator": { "Comparator": "gt", "Type": "GreaterValue" },
                            "Type": "CurrentDate"
                        },
                        {
                            "Headers": ["To", "Cc", "Bcc"],
                            "Keys": [address],
                            "Match": { "Type": "Is" },
                            "Format": { "Type": "UnicodeCaseMap" },
                            "AddressPart": { "Type": "All" },
                            "Type": "Address"
                        }
                    ],
                    "Type": "AllOf"
                },
                "Then": [{ "Message": message, "Args": [], "Type": "Vacation" }],
                "Type": "If"
            })
        };
        json!([
            { "List": ["include", "environment", "variables", "comparator-i;ascii-numeric"], "Type": "Require" },
            { "List": ["fileinto", "imap4flags", "date", "vacation"], "Type": "Require" },
            { "List": ["relational"], "Type": "Require" },
            rule("someone@example.ch", "Autoresponder one"),
            rule("other@example.com", "Autoresponder two")
        ])
    }

    // === Typed ===

    /// A filter with `width` conditions cycling through every type and comparator.
    pub fn wide_filter(width: usize) -> SimpleFilter {
        const TYPES: [&str; 3] = ["sender", "recipient", "subject"];
        const COMPARATORS: [&str; 10] = [
            "contains", "!contains", "is", "!is", "matches", "!matches", "starts", "!starts",
            "ends", "!ends",
        ];

        let conditions = (0..width)
            .map(|i| Condition {
                kind: labeled(TYPES[i % TYPES.len()]),
                comparator: labeled(COMPARATORS[i % COMPARATORS.len()]),
                values: vec![
                    TextValue::from(format!("value-{}", i)),
                    TextValue::from(format!("${{var{}}}*", i)),
                ],
            })
            .collect();

        SimpleFilter {
            operator: labeled("any"),
            conditions,
            actions: Actions {
                file_into: vec![Some(TextValue::from("archive")), Some(TextValue::from("${box}"))],
                mark: Mark {
                    read: true,
                    starred: false,
                },
                vacation: Some(TextValue::from("away until ${date}")),
            },
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over `SieveResult`.

    use super::*;

    #[track_caller]
    pub fn assert_invalid_input<T: std::fmt::Debug>(result: &SieveResult<T>) {
        match result {
            Err(SieveError::InvalidInput { .. }) => {}
            other => panic!("Expected InvalidInputError, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_unsupported<T: std::fmt::Debug>(result: &SieveResult<T>) {
        match result {
            Err(SieveError::UnsupportedRepresentation { .. }) => {}
            other => panic!("Expected UnsupportedRepresentationError, got: {:?}", other),
        }
    }

    /// Assert a tree holds exactly one node of the given `Type`.
    #[track_caller]
    pub fn assert_single_node(tree: &FilterTree, kind: &str) {
        let count = tree
            .iter()
            .filter(|node| {
                matches!(
                    (node, kind),
                    (Node::Require(_), "Require")
                        | (Node::If(_), "If")
                        | (Node::Comment(_), "Comment")
                        | (Node::Set(_), "Set")
                )
            })
            .count();
        assert_eq!(count, 1, "expected one {} node in {:?}", kind, tree);
    }
}
