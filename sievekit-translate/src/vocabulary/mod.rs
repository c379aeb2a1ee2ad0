//! Vocabulary Tables
//!
//! Static bidirectional maps between simple-model tokens and filter tree tokens,
//! plus the human labels the UI shows. Every lookup from a token fails with
//! `InvalidInputError` when the token is absent; nothing silently defaults.

mod templates;

pub use templates::*;

use sievekit_core::{LabeledValue, MatchType, SieveError, SieveResult, TestListKind};

/// Prefix marking a negated comparator token.
pub const NEGATION_PREFIX: char = '!';

// ============================================================================
// OPERATOR
// ============================================================================

/// Boolean combinator of the simple model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    All,
    Any,
}

impl Operator {
    pub fn from_token(token: &str) -> SieveResult<Self> {
        match token {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(SieveError::invalid_input(format!(
                "unrecognized operator: {}",
                other
            ))),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }

    pub fn test_list_kind(self) -> TestListKind {
        match self {
            Self::All => TestListKind::AllOf,
            Self::Any => TestListKind::AnyOf,
        }
    }

    pub fn from_test_list_kind(kind: TestListKind) -> Self {
        match kind {
            TestListKind::AllOf => Self::All,
            TestListKind::AnyOf => Self::Any,
        }
    }

    /// Word used by the `@type` annotation of the fidelity comment.
    pub fn annotation(self) -> &'static str {
        match self {
            Self::All => "and",
            Self::Any => "or",
        }
    }

    pub fn from_annotation(word: &str) -> SieveResult<Self> {
        match word {
            "and" => Ok(Self::All),
            "or" => Ok(Self::Any),
            other => Err(SieveError::invalid_input(format!(
                "Unknown type \"{}\"",
                other
            ))),
        }
    }

    pub fn labeled(self) -> SieveResult<LabeledValue> {
        labeled(self.token())
    }
}

// ============================================================================
// CONDITION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Sender,
    Recipient,
    Subject,
    Attachments,
}

impl ConditionType {
    pub fn from_token(token: &str) -> SieveResult<Self> {
        match token {
            "sender" => Ok(Self::Sender),
            "recipient" => Ok(Self::Recipient),
            "subject" => Ok(Self::Subject),
            "attachments" => Ok(Self::Attachments),
            other => Err(SieveError::invalid_input(format!(
                "unrecognized condition type: {}",
                other
            ))),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Recipient => "recipient",
            Self::Subject => "subject",
            Self::Attachments => "attachments",
        }
    }

    pub fn labeled(self) -> SieveResult<LabeledValue> {
        labeled(self.token())
    }
}

// ============================================================================
// COMPARATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorKind {
    Contains,
    Is,
    Matches,
    Starts,
    Ends,
}

impl ComparatorKind {
    pub fn from_token(token: &str) -> SieveResult<Self> {
        match token {
            "contains" => Ok(Self::Contains),
            "is" => Ok(Self::Is),
            "matches" => Ok(Self::Matches),
            "starts" => Ok(Self::Starts),
            "ends" => Ok(Self::Ends),
            other => Err(SieveError::invalid_input(format!(
                "Unrecognized simple condition: {}",
                other
            ))),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Is => "is",
            Self::Matches => "matches",
            Self::Starts => "starts",
            Self::Ends => "ends",
        }
    }

    /// Match type of the lowered test. `starts`/`ends` fold into `Matches`.
    pub fn match_type(self) -> MatchType {
        match self {
            Self::Contains => MatchType::Contains,
            Self::Is => MatchType::Is,
            Self::Matches | Self::Starts | Self::Ends => MatchType::Matches,
        }
    }

    /// Structural inverse of `match_type`; affixed comparators are not recoverable here.
    pub fn from_match_type(match_type: MatchType) -> Self {
        match match_type {
            MatchType::Contains => Self::Contains,
            MatchType::Is => Self::Is,
            MatchType::Matches => Self::Matches,
        }
    }

    pub fn is_affixed(self) -> bool {
        matches!(self, Self::Starts | Self::Ends)
    }
}

/// A comparator with its negation flag, e.g. `!starts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub kind: ComparatorKind,
    pub negate: bool,
}

impl Comparator {
    pub fn new(kind: ComparatorKind, negate: bool) -> Self {
        Self { kind, negate }
    }

    pub fn parse(token: &str) -> SieveResult<Self> {
        let (negate, bare) = split_negation(token);
        Ok(Self::new(ComparatorKind::from_token(bare)?, negate))
    }

    pub fn token(self) -> String {
        negated(self.kind.token(), self.negate)
    }

    pub fn labeled(self) -> SieveResult<LabeledValue> {
        labeled(&self.token())
    }
}

/// Split a leading `!` off a token.
pub fn split_negation(token: &str) -> (bool, &str) {
    match token.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, token),
    }
}

pub fn negated(token: &str, negate: bool) -> String {
    if negate {
        format!("{}{}", NEGATION_PREFIX, token)
    } else {
        token.to_string()
    }
}

// ============================================================================
// LABELS
// ============================================================================

const LABELS: &[(&str, &str)] = &[
    ("all", "All"),
    ("any", "Any"),
    ("subject", "Subject"),
    ("sender", "Sender"),
    ("recipient", "Recipient"),
    ("attachments", "Attachments"),
    ("contains", "contains"),
    ("!contains", "does not contain"),
    ("is", "is exactly"),
    ("!is", "is not"),
    ("matches", "matches"),
    ("!matches", "does not match"),
    ("starts", "begins with"),
    ("!starts", "does not begin with"),
    ("ends", "ends with"),
    ("!ends", "does not end with"),
];

/// Human label of a token.
pub fn label_for(token: &str) -> SieveResult<&'static str> {
    LABELS
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, label)| *label)
        .ok_or_else(|| SieveError::invalid_input(format!("no label for token {}", token)))
}

/// Token of a human label.
pub fn token_for_label(label: &str) -> SieveResult<&'static str> {
    LABELS
        .iter()
        .find(|(_, value)| *value == label)
        .map(|(key, _)| *key)
        .ok_or_else(|| SieveError::invalid_input(format!("no token for label {}", label)))
}

pub fn labeled(token: &str) -> SieveResult<LabeledValue> {
    Ok(LabeledValue::new(token, label_for(token)?))
}
