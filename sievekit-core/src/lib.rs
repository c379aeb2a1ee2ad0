//! Sievekit Core - Entity Types
//!
//! Pure data structures with no translation logic. The translator crate depends on this.
//! Two representations of one email filter live here:
//!
//! - the simple model (`SimpleFilter`): one operator, ordered conditions, fixed actions
//! - the filter tree (`FilterTree`): ordered Sieve-like nodes consumed by an external renderer

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod error;
pub mod simple;
pub mod tree;

pub use config::*;
pub use error::*;
pub use simple::*;
pub use tree::*;

// ============================================================================
// TEXT VALUES
// ============================================================================

/// Tag carried by every variable-bearing string.
pub const VARIABLE_STRING: &str = "VariableString";

/// A string whose text belongs to the engine's template language.
///
/// Literal `${...}` sequences inside `value` have been escaped as
/// `${dollar}{...}`; anything else shaped like `${name}` is a live substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableToken {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl VariableToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            kind: VARIABLE_STRING.to_string(),
            value: value.into(),
        }
    }

    pub fn is_variable_string(&self) -> bool {
        self.kind == VARIABLE_STRING
    }
}

/// Either a raw string or a tagged variable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Plain(String),
    Variable(VariableToken),
}

impl TextValue {
    /// Inner text regardless of tagging.
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Variable(token) => &token.value,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

impl From<&str> for TextValue {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

impl From<String> for TextValue {
    fn from(s: String) -> Self {
        Self::Plain(s)
    }
}

impl From<VariableToken> for TextValue {
    fn from(token: VariableToken) -> Self {
        Self::Variable(token)
    }
}

// ============================================================================
// VERSION
// ============================================================================

/// Output scaffolding version of the filter tree.
///
/// V1 is a bare `Require` + rule. V2 adds the extension bundle, the spam guard
/// and the fidelity comment. Individual tests and actions are lowered the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Version {
    V1,
    V2,
}

impl TryFrom<u8> for Version {
    type Error = SieveError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(SieveError::invalid_input(format!(
                "unknown filter tree version {}",
                other
            ))),
        }
    }
}

impl From<Version> for u8 {
    fn from(version: Version) -> Self {
        match version {
            Version::V1 => 1,
            Version::V2 => 2,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

// ============================================================================
// TESTS
// ============================================================================
