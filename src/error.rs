use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum TimingError {
    /// `set_log_file` was given a path that is missing or not writable.
    #[error("invalid log file configuration: {0}")]
    Configuration(String),

    /// `stop` was called for a metric with no pending start. Accumulators
    /// are left untouched when this is returned.
    #[error("no timer running for metric '{0}'")]
    TimerNotRunning(String),
}
