//! SIEVEKIT Translate - Simple Filter ⇄ Filter Tree
//!
//! This crate turns the flat, UI-facing simple filter into the Sieve-like
//! filter tree consumed by an external renderer, and back again without losing
//! the user's intent.
//!
//! Architecture:
//! ```text
//! SimpleFilter (JSON)                     FilterTree (JSON)
//!     ↓                                       ↓
//! Compiler (validate + lower)             RuleDocument (sort + cardinality)
//!     ↓                                       ↓
//! Escaping (affix, wildcards, ${..})      Decompiler (lift + fidelity checks)
//!     ↓                                       ↓
//! Scaffolding (V1 / V2)                   Unescaping
//!     ↓                                       ↓
//! FilterTree                              SimpleFilter
//! ```
//!
//! Both directions share the vocabulary tables. The facade wraps them and
//! degrades recoverable errors to empty values.

pub mod compiler;
pub mod decompiler;
pub mod escape;
pub mod facade;
pub mod fidelity;
pub mod vocabulary;

pub use compiler::FilterCompiler;
pub use decompiler::FilterDecompiler;
pub use facade::SieveTranslator;
pub use fidelity::{FidelityMetadata, ParsedFidelity};
pub use vocabulary::{Comparator, ComparatorKind, ConditionType, Operator};

use sievekit_core::{FilterTree, Node, SieveResult, SimpleFilter, Version};

/// Compile with the default configuration.
pub fn compile(simple: &SimpleFilter, version: Version) -> SieveResult<FilterTree> {
    FilterCompiler::with_defaults().compile(simple, version)
}

/// Decompile a tree.
pub fn decompile(tree: &[Node]) -> SieveResult<SimpleFilter> {
    FilterDecompiler::new().decompile(tree)
}
