//! Public facade
//!
//! JSON in, JSON out. Recoverable failures degrade to an empty value (`[]` for
//! a tree, `{}` for a simple filter) so a bad rule never takes the caller down.
//! `InternalError` is returned as `Err` untouched.

use crate::compiler::FilterCompiler;
use crate::decompiler::FilterDecompiler;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sievekit_core::{
    FilterTree, Node, SieveConfig, SieveError, SieveResult, SimpleFilter, Version,
};
use tracing::warn;

/// Entry point bundling a compiler and a decompiler under one config.
#[derive(Debug, Clone)]
pub struct SieveTranslator {
    compiler: FilterCompiler,
    decompiler: FilterDecompiler,
}

impl SieveTranslator {
    pub fn new(config: SieveConfig) -> SieveResult<Self> {
        Ok(Self {
            compiler: FilterCompiler::new(config)?,
            decompiler: FilterDecompiler::new(),
        })
    }

    pub fn config(&self) -> &SieveConfig {
        self.compiler.config()
    }

    // ========================================================================
    // TYPED
    // ========================================================================

    pub fn compile(&self, simple: &SimpleFilter, version: Version) -> SieveResult<FilterTree> {
        self.compiler.compile(simple, version)
    }

    pub fn decompile(&self, tree: &[Node]) -> SieveResult<SimpleFilter> {
        self.decompiler.decompile(tree)
    }

    /// Parse and compile, without the empty-value fallback.
    pub fn compile_value(&self, simple: &Value, version: Option<Version>) -> SieveResult<FilterTree> {
        let simple = SimpleFilter::deserialize(simple)?;
        self.compile(&simple, version.unwrap_or(self.config().default_version))
    }

    /// Parse and decompile, without the empty-value fallback.
    pub fn decompile_value(&self, tree: &Value) -> SieveResult<SimpleFilter> {
        if !tree.is_array() {
            return Err(SieveError::unsupported(
                "Unsupported filter representation: array expected",
            ));
        }
        let nodes = FilterTree::deserialize(tree)?;
        self.decompile(&nodes)
    }

    // ========================================================================
    // JSON WITH FALLBACK
    // ========================================================================

    /// Compile a JSON simple filter. `version` must be 1 or 2 when given.
    pub fn to_tree(&self, simple: &Value, version: Option<u8>) -> SieveResult<Value> {
        let result = version
            .map(Version::try_from)
            .transpose()
            .and_then(|version| self.compile_value(simple, version));
        degrade(result, json!([]), "to_tree")
    }

    /// Decompile a JSON filter tree.
    pub fn from_tree(&self, tree: &Value) -> SieveResult<Value> {
        degrade(self.decompile_value(tree), json!({}), "from_tree")
    }
}

impl Default for SieveTranslator {
    fn default() -> Self {
        Self {
            compiler: FilterCompiler::with_defaults(),
            decompiler: FilterDecompiler::new(),
        }
    }
}

fn degrade<T: Serialize>(
    result: SieveResult<T>,
    fallback: Value,
    direction: &'static str,
) -> SieveResult<Value> {
    match result {
        Ok(output) => serde_json::to_value(output)
            .map_err(|e| SieveError::internal(format!("failed to serialize output: {}", e))),
        Err(err) if err.is_recoverable() => {
            warn!(
                direction,
                error.name = err.name(),
                error.message = err.message(),
                "translation failed, returning empty value"
            );
            Ok(fallback)
        }
        Err(err) => Err(err),
    }
}
