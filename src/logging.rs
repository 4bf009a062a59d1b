//! Opt-in file logging for applications built on this crate.
//!
//! Nothing is logged unless the configured environment variable names a log
//! file, so stderr only ever carries what the runner prints for users.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable [`init_tracing`] reads the log file path from.
pub const LOG_ENV_VAR: &str = "STRUCTURED_CLI_LOG";

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// File logging setup: which variable names the log file, and the fallback
/// filter directive.
#[derive(Debug, Clone)]
pub struct Logging {
    env_var: String,
    default_filter: String,
}

impl Logging {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    pub fn default_filter(mut self, directive: impl Into<String>) -> Self {
        self.default_filter = directive.into();
        self
    }

    /// Path the log would be written to, if the variable is set.
    pub fn log_path(&self) -> Option<PathBuf> {
        let base = std::env::var_os(&self.env_var).filter(|value| !value.is_empty())?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Some(unique_log_path(Path::new(&base), timestamp, std::process::id()))
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }

    /// Install the subscriber. Returns the log file in use, or `None` when
    /// logging stays off.
    ///
    /// An already installed global subscriber (e.g. from an embedding
    /// binary) is left alone.
    pub fn init(&self) -> Option<PathBuf> {
        let path = self.log_path()?;
        let file = match std::fs::File::create(&path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("Warning: failed to create log file {}: {err}", path.display());
                return None;
            }
        };

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(self.filter())
            .with(file_layer)
            .try_init()
            .ok()
            .map(|()| path)
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(LOG_ENV_VAR)
    }
}

/// `{base}.{timestamp}.{pid}`, so concurrent invocations get their own file.
fn unique_log_path(base: &Path, timestamp: u64, pid: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{timestamp}.{pid}"));
    PathBuf::from(name)
}

/// Initialize file logging from [`LOG_ENV_VAR`] with the default filter.
pub fn init_tracing() -> Option<PathBuf> {
    Logging::default().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_log_path_appends_timestamp_and_pid() {
        let path = unique_log_path(Path::new("/tmp/tool.log"), 1_700_000_000, 42);
        assert_eq!(path, PathBuf::from("/tmp/tool.log.1700000000.42"));
    }

    #[test]
    fn test_unset_variable_disables_logging() {
        let logging = Logging::new("STRUCTURED_CLI_TEST_LOG_NEVER_SET");
        assert_eq!(logging.log_path(), None);
        assert_eq!(logging.init(), None);
    }

    #[test]
    fn test_default_reads_crate_variable() {
        let logging = Logging::default().default_filter("debug");
        assert_eq!(logging.env_var, LOG_ENV_VAR);
        assert_eq!(logging.default_filter, "debug");
    }
}
