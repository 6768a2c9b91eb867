//! Observability: per-thread write telemetry and the sink abstraction.
//!
//! Counters live in thread-local state, so a report only covers writes
//! that ran on the calling thread.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CollectionCounters, CollectionSummary, EventOps, EventReport, EventState};
pub use sink::{
    MetricsEvent, MetricsSink, WriteKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
