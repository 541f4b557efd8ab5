//! Interval query engine: predicate compilation and entry replay.

use std::sync::Arc;
use std::time::Duration;

use caselog_core::{IntervalCondition, LogInstance, LogListener, LogSource, TimeInterval};
use caselog_store::{DocumentStore, Field, Predicate, StoredDocument};
use tracing::{info, warn};

use crate::hits::Hits;

/// Documents fetched per cursor page.
pub const PAGE_SIZE: usize = 100;

/// How long a cursor stays valid between page requests.
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Compile an interval condition into the store-side selection predicate.
///
/// - `Start`: the instance started within the interval
/// - `Active`: the instance started no later than the interval's end and
///   either never finished or finished no earlier than the interval's begin
/// - `End`: the instance finished within the interval
pub fn interval_predicate(interval: &TimeInterval, condition: IntervalCondition) -> Predicate {
    match condition {
        IntervalCondition::Start => {
            Predicate::range(Field::Start, Some(interval.begin), Some(interval.end))
        }
        IntervalCondition::Active => Predicate::And(vec![
            Predicate::range(Field::Start, None, Some(interval.end)),
            Predicate::Or(vec![
                Predicate::Missing(Field::End),
                Predicate::range(Field::End, Some(interval.begin), None),
            ]),
        ]),
        IntervalCondition::End => {
            Predicate::range(Field::End, Some(interval.begin), Some(interval.end))
        }
    }
}

/// A [`LogSource`] replaying the entries of every instance selected by an
/// interval condition.
///
/// Entries of a selected instance are delivered in ascending timestamp
/// order; delivery for that instance stops at the first entry past the
/// interval's end, then continues with the next instance. Documents that
/// fail to decode are skipped with a warning.
pub struct IntervalLogSource {
    store: Arc<dyn DocumentStore>,
    interval: TimeInterval,
    condition: IntervalCondition,
    listeners: Vec<LogListener>,
}

impl IntervalLogSource {
    /// Create a source for every instance matching `condition` on `interval`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        interval: TimeInterval,
        condition: IntervalCondition,
    ) -> Self {
        IntervalLogSource {
            store,
            interval,
            condition,
            listeners: Vec::new(),
        }
    }
}

impl LogSource for IntervalLogSource {
    fn register_listener(&mut self, listener: LogListener) {
        self.listeners.push(listener);
    }

    fn process_log(&mut self) {
        let predicate = interval_predicate(&self.interval, self.condition);
        let cursor = match self.store.query(&predicate, PAGE_SIZE, KEEP_ALIVE) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(error = %e, "failed to open instance cursor");
                return;
            }
        };
        info!(
            condition = %self.condition,
            begin = %self.interval.begin,
            end = %self.interval.end,
            "replaying interval query"
        );

        let cutoff = self.interval.end;
        for StoredDocument { id, body } in Hits::new(cursor) {
            let instance: LogInstance = match serde_json::from_value(body) {
                Ok(instance) => instance,
                Err(e) => {
                    warn!(doc = %id, error = %e, "skipping undecodable instance document");
                    continue;
                }
            };
            for entry in instance.entries {
                if entry.timestamp > cutoff {
                    break;
                }
                for listener in &mut self.listeners {
                    listener(entry.clone());
                }
            }
        }
    }
}
