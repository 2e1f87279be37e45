//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tunable parameters of the browsing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed number of documents per page, for both pagination regimes.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl EngineConfig {
    /// Returns the config with degenerate values clamped.
    ///
    /// A page size of zero would make every slice empty and pagination
    /// unable to advance.
    pub fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
