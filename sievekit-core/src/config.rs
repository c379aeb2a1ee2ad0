//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};

/// Translator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SieveConfig {
    /// Version used when the caller does not pick one.
    pub default_version: Version,
    /// `:mime` type attached to vacation replies.
    pub vacation_mime_type: String,
    /// Environment item holding the account spam threshold (V2 spam guard).
    pub spam_threshold_env: String,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            default_version: Version::V1,
            vacation_mime_type: "text/html".to_string(),
            spam_threshold_env: "vnd.proton.spam-threshold".to_string(),
        }
    }
}

impl SieveConfig {
    /// Reject configurations that would produce an unrenderable tree.
    pub fn validate(&self) -> SieveResult<()> {
        if self.vacation_mime_type.trim().is_empty() {
            return Err(SieveError::invalid_input(
                "vacation_mime_type must not be empty",
            ));
        }
        if self.spam_threshold_env.trim().is_empty() {
            return Err(SieveError::invalid_input(
                "spam_threshold_env must not be empty",
            ));
        }
        Ok(())
    }
}
