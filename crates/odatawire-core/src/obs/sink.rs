//! Metrics sink boundary.
//!
//! Writer logic never touches `obs::metrics` directly; all instrumentation
//! flows through `MetricsEvent` and `MetricsSink`.
use crate::{error::NameKind, model::TypeKind, obs::metrics};
use derive_more::Display;
use odatawire_utils::MatchRank;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// WriteKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum WriteKind {
    Entry,
    Link,
    Function,
    Action,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    WriteStart {
        kind: WriteKind,
        target: &'a str,
        batched: bool,
    },
    WriteFinish {
        kind: WriteKind,
        target: &'a str,
        bytes: u64,
        succeeded: bool,
    },
    NameResolved {
        kind: NameKind,
        rank: Option<MatchRank>,
    },
    ValueCoerced {
        kind: TypeKind,
    },
    BatchOperation {
        content_id: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::WriteStart { kind, target, .. } => {
                metrics::with_state_mut(|m| {
                    let counter = match kind {
                        WriteKind::Entry => &mut m.ops.entry_writes,
                        WriteKind::Link => &mut m.ops.link_writes,
                        WriteKind::Function => &mut m.ops.function_writes,
                        WriteKind::Action => &mut m.ops.action_writes,
                    };
                    *counter = counter.saturating_add(1);

                    let entry = m.collections.entry(target.to_string()).or_default();
                    entry.writes = entry.writes.saturating_add(1);
                });
            }

            MetricsEvent::WriteFinish {
                target,
                bytes,
                succeeded,
                ..
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.bytes_written = m.ops.bytes_written.saturating_add(bytes);
                    let entry = m.collections.entry(target.to_string()).or_default();
                    entry.bytes_written = entry.bytes_written.saturating_add(bytes);

                    if !succeeded {
                        m.ops.writes_failed = m.ops.writes_failed.saturating_add(1);
                        entry.failures = entry.failures.saturating_add(1);
                    }
                });
            }

            MetricsEvent::NameResolved { rank, .. } => {
                metrics::with_state_mut(|m| {
                    let counter = match rank {
                        Some(MatchRank::Exact) => &mut m.ops.names_exact,
                        Some(MatchRank::CaseInsensitive) => &mut m.ops.names_case_insensitive,
                        Some(MatchRank::PluralNormalized) => &mut m.ops.names_plural,
                        None => &mut m.ops.names_unresolved,
                    };
                    *counter = counter.saturating_add(1);
                });
            }

            MetricsEvent::ValueCoerced { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.values_coerced = m.ops.values_coerced.saturating_add(1);
                });
            }

            MetricsEvent::BatchOperation { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.batch_operations = m.ops.batch_operations.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
/// The previous sink is restored on every exit path, including unwind.
pub fn with_metrics_sink<T>(sink: Arc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Arc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// Span
/// RAII guard that emits start/finish events for one orchestrator call.
/// A span dropped without `succeed` records a failed write.
///

pub(crate) struct Span {
    kind: WriteKind,
    target: String,
    bytes: u64,
    succeeded: bool,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: WriteKind, target: &str, batched: bool) -> Self {
        record(MetricsEvent::WriteStart {
            kind,
            target,
            batched,
        });

        Self {
            kind,
            target: target.to_string(),
            bytes: 0,
            succeeded: false,
        }
    }

    pub(crate) const fn set_bytes(&mut self, bytes: u64) {
        self.bytes = bytes;
    }

    pub(crate) const fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        record(MetricsEvent::WriteFinish {
            kind: self.kind,
            target: &self.target,
            bytes: self.bytes,
            succeeded: self.succeeded,
        });
    }
}

///
/// TESTS
///
