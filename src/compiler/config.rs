//! Compiler configuration

use serde::{Deserialize, Serialize};

fn default_page_size() -> u64 {
    100
}

/// Defaults applied when a chain only partially specifies a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Count used when `Skip` appears without `Take`
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Offset used when `Take` appears without `Skip`
    #[serde(default)]
    pub default_offset: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            default_offset: 0,
        }
    }
}

impl CompilerConfig {
    /// Checks value ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.default_page_size == 0 {
            return Err("default_page_size must be > 0".into());
        }
        Ok(())
    }
}
