//! Escaping Subsystem
//!
//! Two independent, invertible transforms:
//!
//! - wildcard escaping, applied where `starts`/`ends` are synthesized as a
//!   `:matches` glob with one leading or trailing `*`
//! - variable escaping, which stores literal `${name}` text as
//!   `${dollar}{name}` inside a `VariableString`
//!
//! Compilation runs wildcard work first, then variable escaping. Decompilation
//! runs the inverses in the opposite order.

use crate::vocabulary::{ComparatorKind, DOLLAR_NAME};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sievekit_core::{SieveError, SieveResult, TextValue, VariableToken};

static WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"([*?])").expect("valid regex"));

static ESCAPED_WILDCARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([*?])").expect("valid regex"));

/// `${name}` with an ASCII identifier.
static SUBSTITUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_.]+)\}").expect("valid regex"));

/// `$` directly followed by a `{name}` group.
static LITERAL_SUBSTITUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\{[A-Za-z0-9_.]+\})").expect("valid regex"));

static BRACED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{[A-Za-z0-9_.]+\}").expect("valid regex"));

// ============================================================================
// WILDCARDS
// ============================================================================

/// Backslash-escape `*` and `?`, then double every backslash.
pub fn escape_wildcards(text: &str) -> String {
    WILDCARD.replace_all(text, r"\$1").replace('\\', "\\\\")
}

/// Halve doubled backslashes, then drop the backslash in front of `*` and `?`.
pub fn unescape_wildcards(text: &str) -> String {
    let halved = text.replace("\\\\", "\\");
    ESCAPED_WILDCARD.replace_all(&halved, "$1").into_owned()
}

/// Lower a value for a comparator: `starts` becomes `escaped*`, `ends`
/// becomes `*escaped`, anything else is used verbatim.
pub fn apply_affix(value: &str, kind: ComparatorKind) -> String {
    match kind {
        ComparatorKind::Starts => format!("{}*", escape_wildcards(value)),
        ComparatorKind::Ends => format!("*{}", escape_wildcards(value)),
        _ => value.to_string(),
    }
}

/// Inverse of `apply_affix`. The synthesized `*` is removed from the escaped
/// form before unescaping, so a value whose own text begins or ends with `*`
/// survives.
pub fn strip_affix(value: &str, kind: ComparatorKind) -> SieveResult<String> {
    let stripped = match kind {
        ComparatorKind::Starts => value.strip_suffix('*'),
        ComparatorKind::Ends => value.strip_prefix('*'),
        _ => return Ok(value.to_string()),
    };

    stripped.map(unescape_wildcards).ok_or_else(|| {
        SieveError::unsupported(format!(
            "value {:?} lacks the wildcard implied by comparator {}",
            value,
            kind.token()
        ))
    })
}

// ============================================================================
// VARIABLES
// ============================================================================

/// Store literal `${name}` text safely. Returns the input untouched when it
/// holds no such sequence.
pub fn escape_variables(text: &str) -> TextValue {
    if !LITERAL_SUBSTITUTION.is_match(text) {
        return TextValue::Plain(text.to_string());
    }

    let escaped = LITERAL_SUBSTITUTION.replace_all(text, |caps: &Captures| {
        format!("${{{}}}{}", DOLLAR_NAME, &caps[1])
    });
    TextValue::Variable(VariableToken::new(escaped))
}

/// Recover the literal text of a value.
///
/// Every `${...}` must be a `${dollar}` immediately followed by a `{name}`
/// group; any other substitution is live and cannot be represented.
pub fn unescape_variables(value: &TextValue) -> SieveResult<String> {
    let token = match value {
        TextValue::Plain(text) => return Ok(text.clone()),
        TextValue::Variable(token) => token,
    };
    if !token.is_variable_string() {
        return Err(SieveError::unsupported(format!(
            "Unsupported string type {}",
            token.kind
        )));
    }

    let text = token.value.as_str();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in SUBSTITUTION.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if &caps[1] != DOLLAR_NAME || !BRACED_NAME.is_match(&text[whole.end()..]) {
            return Err(SieveError::unsupported(format!(
                "Unsupported string {}",
                text
            )));
        }
        out.push_str(&text[last..whole.start()]);
        out.push('$');
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Whether an engine-form value relies on the `dollar` declaration.
pub fn references_dollar(value: &TextValue) -> bool {
    match value {
        TextValue::Plain(_) => false,
        TextValue::Variable(token) => SUBSTITUTION
            .captures_iter(&token.value)
            .any(|caps| &caps[1] == DOLLAR_NAME),
    }
}
