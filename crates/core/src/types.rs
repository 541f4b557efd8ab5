//! Domain types for case traces.
//!
//! A *case* is one logical execution of a process. Its raw material is a
//! stream of [`LogEntry`] values, possibly interleaved with other cases;
//! assembly turns them into a [`LogInstance`] with entries ordered by
//! timestamp and start/end markers computed from the ordered sequence.
//!
//! Timestamps are `chrono::DateTime<Utc>` serialized as epoch milliseconds,
//! so the document store can range-compare them as plain integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event in a process log.
///
/// Entries are immutable once produced. The payload is opaque to the
/// pipeline; only the end matcher and downstream consumers interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Identifier of the case this entry belongs to
    pub case_id: String,
    /// When the event occurred
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Opaque event payload
    pub payload: serde_json::Value,
}

impl LogEntry {
    /// Create a new entry.
    pub fn new(
        case_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        LogEntry {
            case_id: case_id.into(),
            timestamp,
            payload,
        }
    }
}

/// The assembled trace of one case.
///
/// Invariants, established at assembly time and relied upon at query time:
/// - `entries` is non-empty and sorted ascending by timestamp
/// - `start` equals the first entry's timestamp
/// - `end` is set iff the end matcher accepted the chronologically last entry
///
/// Instances are written once to the document store, keyed by `case_id`,
/// and never mutated afterwards; re-ingesting a log overwrites them wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInstance {
    /// Case identifier, unique across the store
    pub case_id: String,
    /// Timestamp of the first entry
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// Timestamp of the last entry, if the case is known to have completed
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub end: Option<DateTime<Utc>>,
    /// All entries of the case, ascending by timestamp
    pub entries: Vec<LogEntry>,
}

impl LogInstance {
    /// Whether the case completed (an end marker was observed).
    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }
}

/// A closed time interval with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Inclusive lower bound
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub begin: DateTime<Utc>,
    /// Inclusive upper bound
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create an interval. `begin` must not be after `end`.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(begin <= end, "interval bounds out of order");
        TimeInterval { begin, end }
    }

    /// Whether `t` lies within the interval, bounds included.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.begin <= t && t <= self.end
    }
}

/// How a case's start/end markers must relate to a queried interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntervalCondition {
    /// The case started within the interval
    Start,
    /// The case was active at some point during the interval
    Active,
    /// The case ended within the interval
    End,
}

impl std::fmt::Display for IntervalCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalCondition::Start => write!(f, "START"),
            IntervalCondition::Active => write!(f, "ACTIVE"),
            IntervalCondition::End => write!(f, "END"),
        }
    }
}
