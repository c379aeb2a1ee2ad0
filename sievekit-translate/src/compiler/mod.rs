//! Compiler - Simple Filter to Filter Tree
//!
//! Validates a simple filter, lowers each condition to a test and each action
//! to `Then` nodes, and wraps them in the scaffolding of the requested version.
//!
//! # Pipeline
//!
//! ```text
//! SimpleFilter → validate → ValidatedFilter → lower conditions / actions → assemble(version)
//!                                                   ↓
//!                                      fidelity comparator tokens (V2)
//! ```
//!
//! The input is only borrowed; nothing in it is modified.

use crate::escape::{apply_affix, escape_variables, references_dollar};
use crate::fidelity::{FidelityMetadata, DEFAULT_COMPARATOR};
use crate::vocabulary::*;
use sievekit_core::{
    Action, Actions, AddressPart, AddressTest, FileIntoAction, FilterTree, FlagAction, HeaderTest,
    IfNode, LabeledValue, MatchSpec, Node, NotTest, RequireNode, SieveConfig, SieveError,
    SieveResult, SimpleFilter, Test, TextValue, VacationAction, VacationArgs, VariableToken,
    Version,
};
use std::collections::HashSet;
use tracing::debug;

// ============================================================================
// VALIDATED INPUT
// ============================================================================

/// A simple filter whose tokens have been checked and typed.
#[derive(Debug, Clone)]
struct ValidatedFilter<'a> {
    operator: Operator,
    conditions: Vec<ValidatedCondition<'a>>,
    actions: &'a Actions,
}

#[derive(Debug, Clone)]
struct ValidatedCondition<'a> {
    kind: ConditionType,
    comparator: Comparator,
    values: &'a [TextValue],
}

fn require_labeled(field: &str, labeled: &LabeledValue) -> SieveResult<()> {
    if labeled.value.is_empty() || labeled.label.is_empty() {
        return Err(SieveError::invalid_input(format!("Invalid simple {}", field)));
    }
    Ok(())
}

fn validate(simple: &SimpleFilter) -> SieveResult<ValidatedFilter<'_>> {
    require_labeled("operator", &simple.operator)?;
    let operator = Operator::from_token(&simple.operator.value)?;

    let conditions = simple
        .conditions
        .iter()
        .map(|condition| {
            require_labeled("conditions", &condition.kind)?;
            require_labeled("conditions", &condition.comparator)?;
            Ok(ValidatedCondition {
                kind: ConditionType::from_token(&condition.kind.value)?,
                comparator: Comparator::parse(&condition.comparator.value)?,
                values: &condition.values,
            })
        })
        .collect::<SieveResult<Vec<_>>>()?;

    Ok(ValidatedFilter {
        operator,
        conditions,
        actions: &simple.actions,
    })
}

// ============================================================================
// LOWERED PIECES
// ============================================================================

#[derive(Debug, Default)]
struct LoweredConditions {
    tests: Vec<Test>,
    /// One fidelity token per test.
    comparators: Vec<String>,
    dollar_needed: bool,
}

#[derive(Debug, Default)]
struct LoweredActions {
    then: Vec<Action>,
    requires: Vec<&'static str>,
    dollar_needed: bool,
}

// ============================================================================
// FILTER COMPILER
// ============================================================================

/// Lowers simple filters into filter trees.
///
/// # Example
///
/// ```ignore
/// let compiler = FilterCompiler::new(SieveConfig::default())?;
/// let tree = compiler.compile(&simple, Version::V2)?;
/// ```
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    config: SieveConfig,
}

impl FilterCompiler {
    pub fn new(config: SieveConfig) -> SieveResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compiler over `SieveConfig::default()`, which always validates.
    pub fn with_defaults() -> Self {
        Self {
            config: SieveConfig::default(),
        }
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    /// Compile a simple filter into the node sequence of `version`.
    pub fn compile(&self, simple: &SimpleFilter, version: Version) -> SieveResult<FilterTree> {
        let validated = validate(simple)?;
        let conditions = Self::lower_conditions(&validated.conditions);
        let actions = self.lower_actions(validated.actions);

        debug!(
            version = %version,
            tests = conditions.tests.len(),
            actions = actions.then.len(),
            "compiled simple filter"
        );

        Ok(self.assemble(version, validated.operator, conditions, actions))
    }

    fn lower_conditions(conditions: &[ValidatedCondition<'_>]) -> LoweredConditions {
        let mut lowered = LoweredConditions::default();

        for condition in conditions {
            let Comparator { kind, negate } = condition.comparator;

            lowered.comparators.push(match condition.kind {
                ConditionType::Attachments => negated(DEFAULT_COMPARATOR, negate),
                _ => condition.comparator.token(),
            });

            let test = match condition.kind {
                ConditionType::Attachments => attachment_test(),
                ConditionType::Sender | ConditionType::Recipient | ConditionType::Subject => {
                    let keys = Self::lower_keys(condition.values, kind);
                    lowered.dollar_needed |= keys.iter().any(references_dollar);
                    Self::positional_test(condition.kind, keys, kind)
                }
            };

            lowered.tests.push(if negate {
                Test::Not(NotTest {
                    test: Box::new(test),
                })
            } else {
                test
            });
        }

        lowered
    }

    /// Affix, escape and deduplicate the keys of one test.
    fn lower_keys(values: &[TextValue], kind: ComparatorKind) -> Vec<TextValue> {
        let mut seen = HashSet::new();
        values
            .iter()
            .map(|value| match value {
                TextValue::Plain(text) => escape_variables(&apply_affix(text, kind)),
                TextValue::Variable(token) => TextValue::Variable(VariableToken {
                    kind: token.kind.clone(),
                    value: apply_affix(&token.value, kind),
                }),
            })
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    fn positional_test(kind: ConditionType, keys: Vec<TextValue>, comparator: ComparatorKind) -> Test {
        let match_spec = MatchSpec {
            kind: comparator.match_type(),
        };
        match kind {
            ConditionType::Subject => Test::Header(HeaderTest {
                headers: header_list(&SUBJECT_HEADERS),
                keys,
                match_spec,
                format: unicode_case_map(),
            }),
            ConditionType::Sender | ConditionType::Recipient => Test::Address(AddressTest {
                headers: if kind == ConditionType::Sender {
                    header_list(&SENDER_HEADERS)
                } else {
                    header_list(&RECIPIENT_HEADERS)
                },
                keys,
                match_spec,
                format: unicode_case_map(),
                address_part: Some(AddressPart {
                    kind: ADDRESS_PART_ALL.to_string(),
                }),
            }),
            ConditionType::Attachments => attachment_test(),
        }
    }

    /// File-into destinations, then flags + keep, then vacation.
    fn lower_actions(&self, actions: &Actions) -> LoweredActions {
        let mut lowered = LoweredActions::default();

        for destination in actions.file_into.iter().flatten() {
            if destination.text().is_empty() {
                continue;
            }
            let name = lower_text(destination);
            lowered.dollar_needed |= references_dollar(&name);
            lowered.then.push(Action::FileInto(FileIntoAction { name }));
        }

        if actions.mark.any() {
            let mut flags = Vec::with_capacity(2);
            if actions.mark.read {
                flags.push(SEEN_FLAG.to_string());
            }
            if actions.mark.starred {
                flags.push(FLAGGED_FLAG.to_string());
            }
            lowered.then.push(Action::AddFlag(FlagAction { flags }));
            lowered.then.push(Action::Keep);
        }

        if let Some(message) = actions.vacation.as_ref().filter(|m| !m.text().is_empty()) {
            let message = lower_text(message);
            lowered.dollar_needed |= references_dollar(&message);
            lowered.then.push(Action::Vacation(VacationAction {
                message,
                args: Some(VacationArgs {
                    mime_type: self.config.vacation_mime_type.clone(),
                }),
            }));
            lowered.requires.push(VACATION_EXTENSION);
        }

        lowered
    }

    fn assemble(
        &self,
        version: Version,
        operator: Operator,
        conditions: LoweredConditions,
        actions: LoweredActions,
    ) -> FilterTree {
        let dollar_needed = conditions.dollar_needed || actions.dollar_needed;
        let mut extra = actions.requires;
        if dollar_needed && version == Version::V1 {
            extra.push(VARIABLES_EXTENSION);
        }

        let mut tree = Vec::with_capacity(7);
        if version == Version::V2 {
            tree.push(require_node(&V2_EXTENSION_BUNDLE, &[]));
        }
        tree.push(require_node(&MANDATORY_EXTENSIONS, &extra));
        if dollar_needed {
            tree.push(dollar_declaration());
        }
        if version == Version::V2 {
            tree.extend(spam_guard(&self.config));
            tree.push(FidelityMetadata::new(operator, conditions.comparators).to_node());
        }
        tree.push(Node::If(IfNode::new(
            operator.test_list_kind(),
            conditions.tests,
            actions.then,
        )));
        tree
    }
}

/// Escape a plain string; an engine-form token is kept as is.
fn lower_text(value: &TextValue) -> TextValue {
    match value {
        TextValue::Plain(text) => escape_variables(text),
        TextValue::Variable(_) => value.clone(),
    }
}

fn header_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

/// `require` over `mandatory ∪ extra`, first occurrence wins.
fn require_node(mandatory: &[&str], extra: &[&str]) -> Node {
    let mut list: Vec<String> = Vec::with_capacity(mandatory.len() + extra.len());
    for ext in mandatory.iter().chain(extra) {
        if !list.iter().any(|existing| existing == ext) {
            list.push(ext.to_string());
        }
    }
    Node::Require(RequireNode { list })
}

// ============================================================================
// TESTS
// ============================================================================
