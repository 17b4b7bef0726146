//! CLI configuration.
//!
//! [`CliConfig`] carries the defaults; command-line flags override them.

use std::path::PathBuf;

/// File name of the persisted contract state inside the data directory.
pub const STATE_FILE: &str = "state.json";

/// Configuration for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory holding the persisted state.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "permadao_contract=debug").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("permadao");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl CliConfig {
    /// Path of the state file, unless overridden per command.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }
}
