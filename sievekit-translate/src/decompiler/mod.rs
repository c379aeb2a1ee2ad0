//! Decompiler - Filter Tree to Simple Filter
//!
//! Recovers the simple filter a tree was compiled from. The tree is first
//! sorted into a [`RuleDocument`], then the single rule is lifted condition by
//! condition, guided by the fidelity comment when one is present.
//!
//! Failure falls into two buckets:
//!
//! - `InvalidInputError` when the tree is malformed (missing requirements,
//!   several rules, unknown annotations)
//! - `UnsupportedRepresentationError` when the tree is well formed but says
//!   something the simple model cannot (reject, else branches, live variables)

mod document;

use crate::escape::{references_dollar, strip_affix, unescape_variables};
use crate::fidelity::{self, ParsedFidelity};
use crate::vocabulary::*;
use document::RuleDocument;
use sievekit_core::{
    Action, Actions, Condition, Mark, Node, SieveError, SieveResult, SimpleFilter, Test,
    TextValue,
};
use tracing::debug;

/// Lifts filter trees back into simple filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterDecompiler;

impl FilterDecompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn decompile(&self, tree: &[Node]) -> SieveResult<SimpleFilter> {
        let document = RuleDocument::from_nodes(tree)?;
        if document.rule.otherwise.is_some() {
            return Err(SieveError::unsupported(
                "Unsupported filter representation: else branch",
            ));
        }
        let (kind, tests, then) = document
            .rule
            .rule_parts()
            .ok_or_else(|| SieveError::internal("filter rule lost its tests"))?;

        if !document.dollar_declared && rule_references_dollar(tests, then) {
            return Err(SieveError::invalid_input(
                "Invalid tree representation: dollar used without declaration",
            ));
        }

        let hints = match document.fidelity {
            Some(comment) => fidelity::parse(&comment.text)?,
            None => {
                debug!("no fidelity comment, inferring comparators from match types");
                ParsedFidelity::default()
            }
        };

        let operator = Operator::from_test_list_kind(kind);
        if let Some(declared) = hints.operator {
            if declared != operator {
                return Err(SieveError::unsupported(
                    "Comment and computed type incompatible",
                ));
            }
        }

        // A comment with only `@type` carries no per-test hints.
        if !hints.comparators.is_empty() && hints.comparators.len() != tests.len() {
            return Err(SieveError::unsupported(format!(
                "Comment declares {} comparators for {} tests",
                hints.comparators.len(),
                tests.len()
            )));
        }

        let conditions = tests
            .iter()
            .enumerate()
            .map(|(index, test)| lift_condition(test, hints.comparators.get(index)))
            .collect::<SieveResult<Vec<_>>>()?;
        let actions = lift_actions(then)?;

        debug!(
            conditions = conditions.len(),
            fidelity = document.fidelity.is_some(),
            "decompiled filter tree"
        );

        Ok(SimpleFilter {
            operator: operator.labeled()?,
            conditions,
            actions,
        })
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// What a bare (non-negated) test says in simple-model terms.
struct Classified<'a> {
    kind: ConditionType,
    structural: ComparatorKind,
    keys: &'a [TextValue],
}

fn classify(test: &Test) -> SieveResult<Classified<'_>> {
    fn has(headers: &[String], names: &[&str]) -> bool {
        headers.iter().any(|h| names.contains(&h.as_str()))
    }

    let classified = match test {
        Test::Exists(exists) if has(&exists.headers, &[ATTACHMENT_HEADER]) => Classified {
            kind: ConditionType::Attachments,
            structural: ComparatorKind::Contains,
            keys: &[],
        },
        Test::Header(header) if has(&header.headers, &SUBJECT_HEADERS) => Classified {
            kind: ConditionType::Subject,
            structural: ComparatorKind::from_match_type(header.match_spec.kind),
            keys: &header.keys,
        },
        Test::Address(address) if has(&address.headers, &SENDER_HEADERS) => Classified {
            kind: ConditionType::Sender,
            structural: ComparatorKind::from_match_type(address.match_spec.kind),
            keys: &address.keys,
        },
        Test::Address(address) if has(&address.headers, &RECIPIENT_HEADERS) => Classified {
            kind: ConditionType::Recipient,
            structural: ComparatorKind::from_match_type(address.match_spec.kind),
            keys: &address.keys,
        },
        other => {
            return Err(SieveError::unsupported(format!(
                "Unsupported test {}",
                test_name(other)
            )))
        }
    };
    Ok(classified)
}

fn lift_condition(test: &Test, hint: Option<&Comparator>) -> SieveResult<Condition> {
    let (negate, bare) = match test {
        Test::Not(not) => (true, not.test.as_ref()),
        other => (false, other),
    };
    let classified = classify(bare)?;

    let kind = match hint {
        Some(hint) if hint.negate != negate => {
            return Err(SieveError::unsupported(
                "Comment and computed negation incompatible",
            ))
        }
        Some(hint) if hint.kind.is_affixed() => {
            if classified.structural != ComparatorKind::Matches {
                return Err(SieveError::unsupported(format!(
                    "Comment declares {} over a {} test",
                    hint.kind.token(),
                    classified.structural.token()
                )));
            }
            hint.kind
        }
        Some(hint) if hint.kind != classified.structural => {
            return Err(SieveError::unsupported(
                "Comment and computed comparator incompatible",
            ))
        }
        _ => classified.structural,
    };

    let values = classified
        .keys
        .iter()
        .map(|key| {
            let literal = unescape_variables(key)?;
            strip_affix(&literal, kind).map(TextValue::Plain)
        })
        .collect::<SieveResult<Vec<_>>>()?;

    Ok(Condition {
        kind: classified.kind.labeled()?,
        comparator: Comparator::new(kind, negate).labeled()?,
        values,
    })
}

// ============================================================================
// ACTIONS
// ============================================================================

fn lift_actions(then: &[Action]) -> SieveResult<Actions> {
    let mut actions = Actions {
        file_into: Vec::new(),
        mark: Mark::default(),
        vacation: None,
    };

    for action in then {
        match action {
            Action::Keep => {}
            Action::Discard => actions.file_into.push(Some(TextValue::from(TRASH))),
            Action::FileInto(file_into) => actions
                .file_into
                .push(Some(TextValue::Plain(unescape_variables(&file_into.name)?))),
            Action::AddFlag(add_flag) => {
                actions.mark = Mark {
                    read: add_flag.flags.iter().any(|f| f == SEEN_FLAG),
                    starred: add_flag.flags.iter().any(|f| f == FLAGGED_FLAG),
                };
            }
            Action::Vacation(vacation) => {
                actions.vacation = Some(TextValue::Plain(unescape_variables(&vacation.message)?));
            }
            Action::Return
            | Action::Stop
            | Action::Reject
            | Action::Redirect
            | Action::Unsupported => {
                return Err(SieveError::unsupported(format!(
                    "Unsupported filter representation: {}",
                    action_name(action)
                )))
            }
        }
    }
    Ok(actions)
}

// ============================================================================
// HELPERS
// ============================================================================

fn rule_references_dollar(tests: &[Test], then: &[Action]) -> bool {
    fn test_refs(test: &Test) -> bool {
        match test {
            Test::Header(header) => header.keys.iter().any(references_dollar),
            Test::Address(address) => address.keys.iter().any(references_dollar),
            Test::Not(not) => test_refs(&not.test),
            _ => false,
        }
    }

    tests.iter().any(test_refs)
        || then.iter().any(|action| match action {
            Action::FileInto(file_into) => references_dollar(&file_into.name),
            Action::Vacation(vacation) => references_dollar(&vacation.message),
            _ => false,
        })
}

fn test_name(test: &Test) -> &'static str {
    match test {
        Test::Header(_) => "Header",
        Test::Address(_) => "Address",
        Test::Exists(_) => "Exists",
        Test::Not(_) => "Not",
        Test::Environment(_) => "Environment",
        Test::SpamTest(_) => "SpamTest",
        Test::Unsupported => "of unknown type",
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::FileInto(_) => "FileInto",
        Action::AddFlag(_) => "AddFlag",
        Action::Keep => "Keep",
        Action::Discard => "Discard",
        Action::Vacation(_) => "Vacation",
        Action::Return => "Return",
        Action::Stop => "Stop",
        Action::Reject => "Reject",
        Action::Redirect => "Redirect",
        Action::Unsupported => "unknown action",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::FilterCompiler;
    use crate::fidelity::FidelityMetadata;
    use sievekit_core::{
        AddressPart, AddressTest, FileIntoAction, HeaderTest, IfNode, LabeledValue, MatchSpec,
        MatchType, NotTest, RequireNode, SieveConfig, TestListKind, VariableToken, Version,
    };

    fn mandatory() -> Node {
        Node::Require(RequireNode {
            list: MANDATORY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn rule(kind: TestListKind, tests: Vec<Test>, then: Vec<Action>) -> Node {
        Node::If(IfNode::new(kind, tests, then))
    }

    fn subject(match_type: MatchType, keys: &[&str]) -> Test {
        Test::Header(HeaderTest {
            headers: vec!["Subject".to_string()],
            keys: keys.iter().map(|k| TextValue::from(*k)).collect(),
            match_spec: MatchSpec { kind: match_type },
            format: unicode_case_map(),
        })
    }

    fn comment(operator: Operator, comparators: &[&str]) -> Node {
        FidelityMetadata::new(operator, comparators.iter().map(|c| c.to_string()).collect())
            .to_node()
    }

    fn decompile(tree: &[Node]) -> SieveResult<SimpleFilter> {
        FilterDecompiler::new().decompile(tree)
    }

    #[test]
    fn test_v1_tree_infers_structurally() {
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AllOf,
                vec![subject(MatchType::Contains, &["Order"])],
                vec![
                    Action::FileInto(FileIntoAction {
                        name: TextValue::from("important"),
                    }),
                    Action::AddFlag(sievekit_core::FlagAction {
                        flags: vec![SEEN_FLAG.to_string()],
                    }),
                    Action::Keep,
                ],
            ),
        ];
        let simple = decompile(&tree).unwrap();

        assert_eq!(simple.operator, LabeledValue::new("all", "All"));
        assert_eq!(simple.conditions[0].kind, LabeledValue::new("subject", "Subject"));
        assert_eq!(
            simple.conditions[0].comparator,
            LabeledValue::new("contains", "contains")
        );
        assert_eq!(simple.conditions[0].values, vec![TextValue::from("Order")]);
        assert_eq!(simple.actions.file_into, vec![Some(TextValue::from("important"))]);
        assert!(simple.actions.mark.read);
        assert!(!simple.actions.mark.starred);
        assert_eq!(simple.actions.vacation, None);
    }

    #[test]
    fn test_matches_without_comment_stays_matches() {
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AnyOf,
                vec![subject(MatchType::Matches, &["Order*"])],
                Vec::new(),
            ),
        ];
        let simple = decompile(&tree).unwrap();
        assert_eq!(simple.operator.value, "any");
        assert_eq!(simple.conditions[0].comparator.value, "matches");
        assert_eq!(simple.conditions[0].values, vec![TextValue::from("Order*")]);
    }

    #[test]
    fn test_comment_recovers_starts_and_ends() {
        let tree = vec![
            mandatory(),
            comment(Operator::Any, &["starts", "!ends"]),
            rule(
                TestListKind::AnyOf,
                vec![
                    subject(MatchType::Matches, &["Order*"]),
                    Test::Not(NotTest {
                        test: Box::new(subject(MatchType::Matches, &["*\\\\*x"])),
                    }),
                ],
                Vec::new(),
            ),
        ];
        let simple = decompile(&tree).unwrap();
        assert_eq!(simple.conditions[0].comparator.value, "starts");
        assert_eq!(simple.conditions[0].values, vec![TextValue::from("Order")]);
        assert_eq!(
            simple.conditions[1].comparator,
            LabeledValue::new("!ends", "does not end with")
        );
        assert_eq!(simple.conditions[1].values, vec![TextValue::from("*x")]);
    }

    #[test]
    fn test_operator_conflict_is_unsupported() {
        let tree = vec![
            mandatory(),
            comment(Operator::All, &[]),
            rule(TestListKind::AnyOf, Vec::new(), Vec::new()),
        ];
        let err = decompile(&tree).unwrap_err();
        assert!(matches!(err, SieveError::UnsupportedRepresentation { .. }));
        assert!(err.message().contains("type incompatible"));
    }

    #[test]
    fn test_negation_conflict_is_unsupported() {
        let tree = vec![
            mandatory(),
            comment(Operator::All, &["!contains"]),
            rule(
                TestListKind::AllOf,
                vec![subject(MatchType::Contains, &["x"])],
                Vec::new(),
            ),
        ];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::UnsupportedRepresentation { .. })
        ));
    }

    #[test]
    fn test_affixed_hint_over_non_matches_is_unsupported() {
        let tree = vec![
            mandatory(),
            comment(Operator::All, &["starts"]),
            rule(
                TestListKind::AllOf,
                vec![subject(MatchType::Is, &["x*"])],
                Vec::new(),
            ),
        ];
        assert!(decompile(&tree).is_err());
    }

    #[test]
    fn test_comparator_count_mismatch_is_unsupported() {
        let tree = vec![
            mandatory(),
            comment(Operator::All, &["is", "is"]),
            rule(
                TestListKind::AllOf,
                vec![subject(MatchType::Is, &["x"])],
                Vec::new(),
            ),
        ];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::UnsupportedRepresentation { .. })
        ));
    }

    #[test]
    fn test_recipient_and_attachments() {
        let recipient = Test::Address(AddressTest {
            headers: vec!["To".to_string(), "Cc".to_string(), "Bcc".to_string()],
            keys: vec![TextValue::from("a@x")],
            match_spec: MatchSpec { kind: MatchType::Is },
            format: unicode_case_map(),
            address_part: Some(AddressPart {
                kind: ADDRESS_PART_ALL.to_string(),
            }),
        });
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AllOf,
                vec![
                    recipient,
                    Test::Not(NotTest {
                        test: Box::new(attachment_test()),
                    }),
                ],
                vec![Action::Discard],
            ),
        ];
        let simple = decompile(&tree).unwrap();
        assert_eq!(simple.conditions[0].kind.value, "recipient");
        assert_eq!(simple.conditions[0].comparator.label, "is exactly");
        assert_eq!(simple.conditions[1].kind.value, "attachments");
        assert_eq!(simple.conditions[1].comparator.value, "!contains");
        assert!(simple.conditions[1].values.is_empty());
        assert_eq!(simple.actions.file_into, vec![Some(TextValue::from(TRASH))]);
    }

    #[test]
    fn test_unknown_header_set_is_unsupported() {
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AllOf,
                vec![Test::Header(HeaderTest {
                    headers: vec!["X-Priority".to_string()],
                    keys: vec![TextValue::from("1")],
                    match_spec: MatchSpec { kind: MatchType::Is },
                    format: None,
                })],
                Vec::new(),
            ),
        ];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::UnsupportedRepresentation { .. })
        ));
    }

    #[test]
    fn test_reject_and_unknown_actions_are_unsupported() {
        for action in [Action::Reject, Action::Unsupported, Action::Return] {
            let tree = vec![
                mandatory(),
                rule(TestListKind::AllOf, Vec::new(), vec![action.clone()]),
            ];
            let err = decompile(&tree).unwrap_err();
            assert!(err.is_recoverable());
            assert!(matches!(err, SieveError::UnsupportedRepresentation { .. }));
        }
    }

    #[test]
    fn test_else_branch_is_unsupported() {
        let mut if_node = IfNode::new(TestListKind::AllOf, Vec::new(), Vec::new());
        if_node.otherwise = Some(serde_json::json!([{ "Type": "Keep" }]));
        let tree = vec![mandatory(), Node::If(if_node)];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::UnsupportedRepresentation { .. })
        ));
    }

    #[test]
    fn test_live_variable_is_unsupported() {
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AllOf,
                Vec::new(),
                vec![Action::FileInto(FileIntoAction {
                    name: TextValue::Variable(VariableToken::new("${folder}")),
                })],
            ),
        ];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::UnsupportedRepresentation { .. })
        ));
    }

    #[test]
    fn test_escaped_variable_without_declaration_is_invalid() {
        let tree = vec![
            mandatory(),
            rule(
                TestListKind::AllOf,
                Vec::new(),
                vec![Action::FileInto(FileIntoAction {
                    name: TextValue::Variable(VariableToken::new("${dollar}{folder}")),
                })],
            ),
        ];
        assert!(matches!(
            decompile(&tree),
            Err(SieveError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_compiled_v2_tree_round_trips() {
        let simple = SimpleFilter {
            operator: LabeledValue::new("any", "Any"),
            conditions: vec![Condition {
                kind: LabeledValue::new("sender", "Sender"),
                comparator: LabeledValue::new("!ends", "does not end with"),
                values: vec![TextValue::from("${domain}?.com")],
            }],
            actions: Actions {
                file_into: vec![Some(TextValue::from("${box}"))],
                mark: Mark {
                    read: true,
                    starred: true,
                },
                vacation: Some(TextValue::from("gone")),
            },
        };
        let compiler = FilterCompiler::new(SieveConfig::default()).unwrap();
        let tree = compiler.compile(&simple, Version::V2).unwrap();
        assert_eq!(decompile(&tree).unwrap(), simple);
    }
}
