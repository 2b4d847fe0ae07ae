// src/lib.rs
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TimingError;
pub use locator::{LogLocator, PLATFORM_LOG_CANDIDATES, PlatformLogLocator, StaticLogLocator};
pub use registry::{MetricStats, TimingRegistry};
pub use sanitize::sanitize_metric_name;
pub use sink::{HeaderSink, MemoryHeaderSink, NoOpHeaderSink, TimingRecord};

mod clock;
mod error;
mod locator;
mod registry;
mod sanitize;
mod sink;
