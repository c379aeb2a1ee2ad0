//! Typed view over an unordered node list.
//!
//! A filter tree is a multiset of nodes whose order carries little meaning.
//! This module sorts it into named slots and checks every cardinality rule in
//! one pass before anything is lifted.

use crate::fidelity::is_fidelity_comment;
use crate::vocabulary::{is_dollar_declaration, is_spam_guard, MANDATORY_EXTENSIONS};
use sievekit_core::{CommentNode, IfNode, Node, SieveError, SieveResult};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleDocument<'a> {
    /// The one `If` carrying tests and actions that is not a spam guard.
    pub rule: &'a IfNode,
    /// Last comment shaped like fidelity metadata.
    pub fidelity: Option<&'a CommentNode>,
    pub dollar_declared: bool,
}

impl<'a> RuleDocument<'a> {
    pub fn from_nodes(nodes: &'a [Node]) -> SieveResult<Self> {
        let mut extensions: Vec<&str> = Vec::new();
        let mut rules: Vec<&IfNode> = Vec::new();
        let mut fidelity: Vec<&CommentNode> = Vec::new();
        let mut declarations = 0usize;

        for node in nodes {
            match node {
                Node::Require(require) => {
                    extensions.extend(require.list.iter().map(String::as_str));
                }
                Node::If(if_node) => {
                    if if_node.rule_parts().is_some() && !is_spam_guard(if_node) {
                        rules.push(if_node);
                    }
                }
                Node::Comment(comment) => {
                    if is_fidelity_comment(&comment.text) {
                        fidelity.push(comment);
                    }
                }
                Node::Set(set) => {
                    if !is_dollar_declaration(set) {
                        return Err(SieveError::invalid_input(
                            "Invalid tree representation: Invalid set node.",
                        ));
                    }
                    declarations += 1;
                }
            }
        }

        if declarations > 1 {
            return Err(SieveError::invalid_input(
                "Invalid tree representation: dollar declared more than once",
            ));
        }

        if MANDATORY_EXTENSIONS
            .iter()
            .any(|required| !extensions.contains(required))
        {
            return Err(SieveError::invalid_input(
                "Invalid tree representation: requirements",
            ));
        }

        let rule = match rules.as_slice() {
            [rule] => *rule,
            [] => {
                return Err(SieveError::invalid_input(
                    "Invalid tree representation: no filter rule",
                ))
            }
            _ => {
                return Err(SieveError::invalid_input(
                    "Invalid tree representation: too many if blocks",
                ))
            }
        };

        if fidelity.len() > 1 {
            debug!(
                stale = fidelity.len() - 1,
                "several fidelity comments, keeping the last one"
            );
        }

        Ok(Self {
            rule,
            fidelity: fidelity.last().copied(),
            dollar_declared: declarations == 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::dollar_declaration;
    use sievekit_core::{Action, RequireNode, SetNode, TestListKind};

    fn require(list: &[&str]) -> Node {
        Node::Require(RequireNode {
            list: list.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn rule() -> Node {
        Node::If(IfNode::new(TestListKind::AllOf, Vec::new(), vec![Action::Keep]))
    }

    fn comment(text: &str) -> Node {
        Node::Comment(CommentNode {
            text: text.to_string(),
        })
    }

    #[test]
    fn test_requirements_may_span_nodes() {
        let nodes = vec![require(&["fileinto"]), require(&["imap4flags"]), rule()];
        assert!(RuleDocument::from_nodes(&nodes).is_ok());
    }

    #[test]
    fn test_missing_requirement_is_invalid() {
        let nodes = vec![require(&["fileinto"]), rule()];
        assert!(matches!(
            RuleDocument::from_nodes(&nodes),
            Err(SieveError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_two_rules_are_invalid() {
        let nodes = vec![require(&["fileinto", "imap4flags"]), rule(), rule()];
        let err = RuleDocument::from_nodes(&nodes).unwrap_err();
        assert!(err.message().contains("too many if blocks"));
    }

    #[test]
    fn test_no_rule_is_invalid() {
        let nodes = vec![require(&["fileinto", "imap4flags"])];
        assert!(RuleDocument::from_nodes(&nodes).is_err());
    }

    #[test]
    fn test_foreign_set_node_is_invalid() {
        let nodes = vec![
            require(&["fileinto", "imap4flags"]),
            Node::Set(SetNode {
                name: "x".to_string(),
                value: "1".to_string(),
                flags: Vec::new(),
            }),
            rule(),
        ];
        assert!(RuleDocument::from_nodes(&nodes).is_err());
    }

    #[test]
    fn test_dollar_declared_twice_is_invalid() {
        let nodes = vec![
            require(&["fileinto", "imap4flags", "variables"]),
            dollar_declaration(),
            dollar_declaration(),
            rule(),
        ];
        let err = RuleDocument::from_nodes(&nodes).unwrap_err();
        assert!(matches!(err, SieveError::InvalidInput { .. }));
        assert!(err.message().contains("more than once"));
    }

    #[test]
    fn test_single_dollar_declaration_is_recorded() {
        let nodes = vec![
            require(&["fileinto", "imap4flags"]),
            dollar_declaration(),
            rule(),
        ];
        assert!(RuleDocument::from_nodes(&nodes).unwrap().dollar_declared);
    }

    #[test]
    fn test_last_fidelity_comment_wins() {
        let first = "/**\r\n * @type and\r\n */";
        let second = "/**\r\n * @type or\r\n */";
        let nodes = vec![
            require(&["fileinto", "imap4flags"]),
            comment(first),
            comment("# unrelated"),
            comment(second),
            rule(),
        ];
        let document = RuleDocument::from_nodes(&nodes).unwrap();
        assert_eq!(document.fidelity.map(|c| c.text.as_str()), Some(second));
        assert!(!document.dollar_declared);
    }
}
