use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};
use time::OffsetDateTime;

///
/// EventState
/// Ephemeral, in-memory counters for write operations on this thread.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub collections: BTreeMap<String, CollectionCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            collections: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Orchestrator entrypoints
    pub entry_writes: u64,
    pub link_writes: u64,
    pub function_writes: u64,
    pub action_writes: u64,

    // Outcomes
    pub writes_failed: u64,
    pub bytes_written: u64,
    pub batch_operations: u64,

    // Name resolution by rank
    pub names_exact: u64,
    pub names_case_insensitive: u64,
    pub names_plural: u64,
    pub names_unresolved: u64,

    pub values_coerced: u64,
}

///
/// CollectionCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CollectionCounters {
    pub writes: u64,
    pub failures: u64,
    pub bytes_written: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

    u64::try_from(millis).unwrap_or_default()
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `window_start_ms`.
    pub counters: Option<EventState>,
    /// Per-collection counters and averages.
    pub collection_counters: Vec<CollectionSummary>,
}

///
/// CollectionSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub writes: u64,
    pub failures: u64,
    pub bytes_written: u64,
    pub avg_bytes_per_write: f64,
}

/// Build a report; a `window_start_ms` later than the current window
/// yields an empty report.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| start > snap.window_start_ms) {
        return EventReport::default();
    }

    let mut collection_counters: Vec<_> = snap
        .collections
        .iter()
        .map(|(name, c)| CollectionSummary {
            name: name.clone(),
            writes: c.writes,
            failures: c.failures,
            bytes_written: c.bytes_written,
            avg_bytes_per_write: if c.writes > 0 {
                c.bytes_written as f64 / c.writes as f64
            } else {
                0.0
            },
        })
        .collect();

    collection_counters.sort_by(|a, b| match b.writes.cmp(&a.writes) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });

    EventReport {
        counters: Some(snap),
        collection_counters,
    }
}

///
/// TESTS
///
