use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a [`crate::Runner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum time a handler may run, in seconds (default: 1800).
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_seconds: u64,
    /// Where users are asked to report unexpected failures.
    #[serde(default = "default_bug_report_url")]
    pub bug_report_url: String,
    /// Help text width. Defaults to the terminal width.
    #[serde(default)]
    pub help_width: Option<usize>,
}

impl RunnerConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_seconds)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            handler_timeout_seconds: default_handler_timeout(),
            bug_report_url: default_bug_report_url(),
            help_width: None,
        }
    }
}

fn default_handler_timeout() -> u64 {
    30 * 60
}

fn default_bug_report_url() -> String {
    "https://github.com/structured-cli/structured-cli/issues".to_string()
}
