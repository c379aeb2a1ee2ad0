//! Fidelity metadata
//!
//! The filter tree cannot tell `starts`, `ends` and `matches` apart, and the
//! attachment test has no comparator at all. The compiler therefore records the
//! operator and every per-condition comparator token in a doc-style comment:
//!
//! ```text
//! /**
//!  * @type and
//!  * @comparator starts
//!  * @comparator !default
//!  */
//! ```
//!
//! Comparator lines line up by index with the rule's tests. `default` is the
//! placeholder written for attachment conditions and reads back as `contains`.

use crate::vocabulary::{split_negation, Comparator, Operator};
use once_cell::sync::Lazy;
use regex::Regex;
use sievekit_core::{CommentNode, Node, SieveError, SieveResult};

/// Comparator placeholder written for attachment conditions.
pub const DEFAULT_COMPARATOR: &str = "default";

const OPEN: &str = "/**";
const CLOSE: &str = "/";
const LINE_SEPARATOR: &str = "\r\n *";

static COMMENT_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/\*\*\r\n(?:\s\*\s@(?:type|comparator)[^\r]+\r\n)+\s\*/$").expect("valid regex")
});

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s@(\w*)\s(.*)$").expect("valid regex"));

/// Metadata as written by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FidelityMetadata {
    pub operator: Operator,
    /// Comparator tokens, `!`-prefixed when negated.
    pub comparators: Vec<String>,
}

impl FidelityMetadata {
    pub fn new(operator: Operator, comparators: Vec<String>) -> Self {
        Self {
            operator,
            comparators,
        }
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.comparators.len() + 3);
        lines.push(OPEN.to_string());
        lines.push(format!(" @type {}", self.operator.annotation()));
        lines.extend(
            self.comparators
                .iter()
                .map(|comparator| format!(" @comparator {}", comparator)),
        );
        lines.push(CLOSE.to_string());
        lines.join(LINE_SEPARATOR)
    }

    pub fn to_node(&self) -> Node {
        Node::Comment(CommentNode {
            text: self.to_text(),
        })
    }
}

/// Metadata as read back from a tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFidelity {
    pub operator: Option<Operator>,
    pub comparators: Vec<Comparator>,
}

/// Whether a comment carries fidelity metadata.
pub fn is_fidelity_comment(text: &str) -> bool {
    COMMENT_SHAPE.is_match(text)
}

/// Parse the annotation lines of a fidelity comment.
pub fn parse(text: &str) -> SieveResult<ParsedFidelity> {
    let mut parsed = ParsedFidelity::default();
    let mut unknown = Vec::new();

    for chunk in text.split(LINE_SEPARATOR) {
        let Some(caps) = ANNOTATION.captures(chunk) else {
            continue;
        };
        let value = &caps[2];
        match &caps[1] {
            "type" => match Operator::from_annotation(value) {
                Ok(operator) => parsed.operator = Some(operator),
                Err(_) => unknown.push(format!("type \"{}\"", value)),
            },
            "comparator" => match parse_comparator(value) {
                Ok(comparator) => parsed.comparators.push(comparator),
                Err(_) => unknown.push(format!("comparator \"{}\"", value)),
            },
            other => unknown.push(format!("{} \"{}\"", other, value)),
        }
    }

    if !unknown.is_empty() {
        return Err(SieveError::invalid_input(format!(
            "Unknown {}",
            unknown.join(", ")
        )));
    }
    Ok(parsed)
}

fn parse_comparator(token: &str) -> SieveResult<Comparator> {
    let (negate, bare) = split_negation(token);
    if bare == DEFAULT_COMPARATOR {
        return Comparator::parse(if negate { "!contains" } else { "contains" });
    }
    Comparator::parse(token)
}
