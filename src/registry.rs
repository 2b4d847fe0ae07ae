use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::TimingError;
use crate::locator::{self, LogLocator, PlatformLogLocator};
use crate::sanitize::sanitize_metric_name;
use crate::sink::{HeaderSink, NoOpHeaderSink, TimingRecord};

/// Per-metric running totals, surviving across start/stop cycles.
///
/// Created lazily on the first `start` for a name and kept for the lifetime
/// of the registry. `calls` counts completed start/stop pairs only; an
/// unmatched `stop` never touches it.
#[derive(Debug, Clone)]
pub struct MetricStats {
    pub calls: u64,
    pub total: Duration,
    pub first_start: Instant,
}

impl MetricStats {
    fn starting_at(instant: Instant) -> Self {
        Self {
            calls: 0,
            total: Duration::ZERO,
            first_start: instant,
        }
    }

    /// Total accumulated time in milliseconds.
    pub fn total_ms(&self) -> f64 {
        duration_ms(self.total)
    }
}

/// Where `log` output goes.
///
/// Starts unresolved; the first `log` call without an explicit
/// `set_log_file` runs locator discovery exactly once. A discovery miss
/// disables the sink for good rather than erroring, since log output is
/// best-effort diagnostics.
#[derive(Debug)]
enum LogTarget {
    Unresolved,
    Disabled,
    File(PathBuf),
}

/// Named timing segments with per-metric accumulators.
///
/// One registry per request/context: all state is owned, there is no
/// internal locking, and every operation is synchronous (spec'd for the
/// one-logical-thread-per-request model). Collaborators are injected so
/// tests can swap in a manual clock, a buffering header sink and a
/// deterministic log locator.
///
/// The toggle entry points are the primary API: a pair of identical
/// [`profile`](Self::profile) or [`log`](Self::log) calls brackets a code
/// block, the first call starting the timer and the second finishing it.
///
/// # Example
///
/// ```
/// use laptime_core::TimingRegistry;
///
/// let mut registry = TimingRegistry::new();
/// registry.profile("db_query");
/// // ... work being measured ...
/// registry.profile("db_query"); // stops and emits to the header sink
/// ```
pub struct TimingRegistry {
    clock: Arc<dyn Clock>,
    header_sink: Arc<dyn HeaderSink>,
    locator: Arc<dyn LogLocator>,
    timers: HashMap<String, Instant>,
    stats: HashMap<String, MetricStats>,
    log_target: LogTarget,
}

impl TimingRegistry {
    /// A registry with production defaults: system clock, no-op header
    /// sink, platform log locator.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            header_sink: Arc::new(NoOpHeaderSink),
            locator: Arc::new(PlatformLogLocator),
            timers: HashMap::new(),
            stats: HashMap::new(),
            log_target: LogTarget::Unresolved,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_header_sink(mut self, sink: Arc<dyn HeaderSink>) -> Self {
        self.header_sink = sink;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn LogLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Record the current instant as the pending start for `name`.
    ///
    /// Re-starting a running metric discards the earlier pending start
    /// (last start wins; intentional reset-on-restart policy). The first
    /// `start` for a name also creates its accumulator.
    pub fn start(&mut self, name: &str) {
        let now = self.clock.now();
        debug!(event = "Metric", phase = "Start", name = name);
        self.timers.insert(name.to_string(), now);
        self.stats
            .entry(name.to_string())
            .or_insert_with(|| MetricStats::starting_at(now));
    }

    /// Finish the pending timer for `name` and return the elapsed
    /// milliseconds.
    ///
    /// Updates the accumulator (`calls += 1`, `total += elapsed`). Fails
    /// with [`TimingError::TimerNotRunning`] if no start is pending;
    /// accumulators are untouched in that case, so a stray `stop` cannot
    /// silently corrupt statistics.
    pub fn stop(&mut self, name: &str) -> Result<f64, TimingError> {
        let started = self
            .timers
            .remove(name)
            .ok_or_else(|| TimingError::TimerNotRunning(name.to_string()))?;
        Ok(self.finish(name, started))
    }

    /// Toggle aimed at the header sink.
    ///
    /// Not running: start the timer. Running: stop it and emit exactly one
    /// [`TimingRecord`] carrying the sanitized metric name and the elapsed
    /// milliseconds. Call it twice around the block being measured.
    pub fn profile(&mut self, name: &str) {
        match self.timers.remove(name) {
            Some(started) => {
                let elapsed_ms = self.finish(name, started);
                let record = TimingRecord::new(sanitize_metric_name(name), elapsed_ms);
                self.header_sink.on_record(&record);
            }
            None => self.start(name),
        }
    }

    /// Toggle aimed at the log sink.
    ///
    /// Mirrors [`profile`](Self::profile) but appends lines to the log
    /// file instead of emitting headers. The start branch writes a
    /// "started" line when `debug` is set; the stop branch writes one line
    /// with this call's duration, the accumulated call count and the
    /// accumulated total (durations to 5 decimal places). Metric names are
    /// logged verbatim.
    ///
    /// Best-effort: with no usable log file the call is a silent no-op.
    pub fn log(&mut self, name: &str, debug: bool) {
        match self.timers.remove(name) {
            Some(started) => {
                let elapsed_ms = self.finish(name, started);
                let line = self
                    .stats
                    .get(name)
                    .map(|stats| stop_log_line(name, elapsed_ms, stats));
                if let Some(line) = line {
                    self.write_log_line(&line);
                }
            }
            None => {
                if debug {
                    self.write_log_line(&format!("Server-Timing: {name} - started"));
                }
                self.start(name);
            }
        }
    }

    /// Point the log sink at `path`, overriding auto-discovery.
    ///
    /// The path must exist and be openable for append at call time;
    /// otherwise the call fails with [`TimingError::Configuration`] and the
    /// current target is left as it was. The last successful call wins.
    pub fn set_log_file(&mut self, path: impl AsRef<Path>) -> Result<(), TimingError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TimingError::Configuration(format!(
                "log file does not exist: {}",
                path.display()
            )));
        }
        if !locator::is_writable(path) {
            return Err(TimingError::Configuration(format!(
                "log file is not writable: {}",
                path.display()
            )));
        }
        self.log_target = LogTarget::File(path.to_path_buf());
        Ok(())
    }

    /// Accumulated statistics for `name`, if it has ever been started.
    pub fn stats(&self, name: &str) -> Option<&MetricStats> {
        self.stats.get(name)
    }

    /// Whether `name` has an unmatched pending start.
    pub fn is_running(&self, name: &str) -> bool {
        self.timers.contains_key(name)
    }

    fn finish(&mut self, name: &str, started: Instant) -> f64 {
        let elapsed = self.clock.now().saturating_duration_since(started);
        let entry = self
            .stats
            .entry(name.to_string())
            .or_insert_with(|| MetricStats::starting_at(started));
        entry.calls += 1;
        entry.total += elapsed;
        let elapsed_ms = duration_ms(elapsed);
        debug!(
            event = "Metric",
            phase = "Stop",
            name = name,
            elapsed_ms = elapsed_ms,
            calls = entry.calls
        );
        elapsed_ms
    }

    fn log_path(&mut self) -> Option<PathBuf> {
        if matches!(self.log_target, LogTarget::Unresolved) {
            self.log_target = match locator::discover(self.locator.as_ref()) {
                Some(path) => LogTarget::File(path),
                None => {
                    warn!("No writable log file found; timing log output is disabled.");
                    LogTarget::Disabled
                }
            };
        }
        match &self.log_target {
            LogTarget::File(path) => Some(path.clone()),
            _ => None,
        }
    }

    // Single attempt per line; a failed append is reported and dropped so
    // a broken diagnostics sink cannot take down the request.
    fn write_log_line(&mut self, line: &str) {
        let Some(path) = self.log_path() else {
            return;
        };
        let result = OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(err) = result {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to append timing line to log file."
            );
        }
    }
}

impl Default for TimingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn stop_log_line(name: &str, elapsed_ms: f64, stats: &MetricStats) -> String {
    format!(
        "Server-Timing: {name} - ({elapsed_ms:.5} ms - called {calls} times, total time: {total:.5} ms)",
        calls = stats.calls,
        total = stats.total_ms()
    )
}

fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests;
