//! Log-path discovery strategies.
//!
//! When no log file has been configured explicitly, the registry asks a
//! [`LogLocator`] for an ordered candidate list and takes the first path
//! that exists and can be opened for append. Discovery runs at most once
//! per registry; a miss disables the log sink rather than erroring.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Supplies candidate log paths, in probe order.
pub trait LogLocator: Send + Sync {
    fn candidates(&self) -> Vec<PathBuf>;
}

/// Well-known platform log locations, most specific first.
pub const PLATFORM_LOG_CANDIDATES: &[&str] = &[
    "/var/log/httpd/error_log",
    "/var/log/apache2/error.log",
    "/var/log/nginx/error.log",
    "/var/log/syslog",
    "/var/log/messages",
    "/var/log/system.log",
];

/// Probes the fixed platform candidate list.
#[derive(Debug, Default)]
pub struct PlatformLogLocator;

impl LogLocator for PlatformLogLocator {
    fn candidates(&self) -> Vec<PathBuf> {
        PLATFORM_LOG_CANDIDATES.iter().map(PathBuf::from).collect()
    }
}

/// A fixed caller-supplied candidate list, mainly for tests and hosts with
/// their own log layout.
#[derive(Debug, Clone)]
pub struct StaticLogLocator {
    candidates: Vec<PathBuf>,
}

impl StaticLogLocator {
    pub fn new(candidates: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl LogLocator for StaticLogLocator {
    fn candidates(&self) -> Vec<PathBuf> {
        self.candidates.clone()
    }
}

/// Whether `path` can be opened for append right now.
pub(crate) fn is_writable(path: &Path) -> bool {
    OpenOptions::new().append(true).open(path).is_ok()
}

/// First existing, writable candidate from `locator`, if any.
pub(crate) fn discover(locator: &dyn LogLocator) -> Option<PathBuf> {
    locator
        .candidates()
        .into_iter()
        .find(|path| path.exists() && is_writable(path))
}
