//! Log source and end-matcher contracts.
//!
//! A [`LogSource`] is a push-based producer: the consumer registers a
//! listener, then drives [`LogSource::process_log`], which invokes the
//! listener once per entry, synchronously, in source-determined order.
//! Entries of different cases may arrive interleaved and unsorted.

use crate::types::LogEntry;

/// Callback receiving entries from a [`LogSource`].
pub type LogListener = Box<dyn FnMut(LogEntry) + Send>;

/// A push-based producer of log entries.
pub trait LogSource {
    /// Register a listener to receive every entry of the log.
    fn register_listener(&mut self, listener: LogListener);

    /// Drive the log: invoke the registered listeners once per entry,
    /// synchronously, then return. Order across cases is unspecified.
    fn process_log(&mut self);
}

/// Decides whether an entry denotes case completion.
pub trait EndMatcher: Send + Sync {
    /// Whether this entry marks the end of its case.
    fn matches(&self, entry: &LogEntry) -> bool;
}

impl<F> EndMatcher for F
where
    F: Fn(&LogEntry) -> bool + Send + Sync,
{
    fn matches(&self, entry: &LogEntry) -> bool {
        self(entry)
    }
}

/// Matches entries whose payload equals a sentinel value.
pub struct PayloadEquals(serde_json::Value);

impl PayloadEquals {
    /// Match entries whose payload equals `sentinel`.
    pub fn new(sentinel: serde_json::Value) -> Self {
        PayloadEquals(sentinel)
    }
}

impl EndMatcher for PayloadEquals {
    fn matches(&self, entry: &LogEntry) -> bool {
        entry.payload == self.0
    }
}

/// Matches nothing; every case stays open.
pub struct NeverEnds;

impl EndMatcher for NeverEnds {
    fn matches(&self, _entry: &LogEntry) -> bool {
        false
    }
}

/// An in-memory [`LogSource`] replaying a fixed sequence of entries.
///
/// Entries are delivered in insertion order, which deliberately need not be
/// grouped or sorted by case.
#[derive(Default)]
pub struct VecLogSource {
    entries: Vec<LogEntry>,
    listeners: Vec<LogListener>,
}

impl VecLogSource {
    /// Create a source replaying `entries` in order.
    pub fn new(entries: Vec<LogEntry>) -> Self {
        VecLogSource {
            entries,
            listeners: Vec::new(),
        }
    }
}

impl LogSource for VecLogSource {
    fn register_listener(&mut self, listener: LogListener) {
        self.listeners.push(listener);
    }

    fn process_log(&mut self) {
        for entry in self.entries.drain(..) {
            for listener in &mut self.listeners {
                listener(entry.clone());
            }
        }
    }
}
