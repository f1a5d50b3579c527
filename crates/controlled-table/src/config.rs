//! Table configuration.
//!
//! Configuration is read from TOML. Every key is optional:
//!
//! ```toml
//! initial_row_count = 8
//! page_size = 10
//! seed = 42
//! log_filter = "controlled_table=debug"
//! commit_on_blur_when_clean = true
//! ```

use std::fs;
use std::path::Path;

use controlled_table_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::TableState;

/// Settings for a [`ControlledTable`](crate::ControlledTable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows generated at startup and on every regenerate.
    pub initial_row_count: usize,
    /// Page size of the builder's initial state.
    pub page_size: usize,
    /// Seed for reproducible sample data. Entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Default `tracing` filter directive for hosts that install a subscriber.
    pub log_filter: String,
    /// Whether blurring an unchanged cell still commits its value.
    pub commit_on_blur_when_clean: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_row_count: 8,
            page_size: 10,
            seed: None,
            log_filter: "info".to_string(),
            commit_on_blur_when_clean: true,
        }
    }
}

impl TableConfig {
    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::config(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::config_parse(path, e))?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_parse("<inline>", e))
    }

    /// The state the table's builder declares as its starting point.
    pub fn initial_state(&self) -> TableState {
        TableState::with_page_size(self.page_size)
    }
}
