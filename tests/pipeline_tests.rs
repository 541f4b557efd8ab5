//! End-to-end pipeline tests through the `CaseLog` facade:
//! assembly into the document store, then interval-scoped replay.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use caselog::prelude::*;
use caselog::LogListener;
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ts(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

fn entry(case: &str, ms: i64, payload: serde_json::Value) -> LogEntry {
    LogEntry::new(case, ts(ms), payload)
}

fn stored_instance(store: &MemoryStore, id: &str) -> LogInstance {
    serde_json::from_value(store.get(id).expect("document missing")).unwrap()
}

/// Listener collecting (case, timestamp millis) pairs.
fn collecting_listener() -> (LogListener, Arc<Mutex<Vec<(String, i64)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let listener: LogListener = Box::new(move |entry: LogEntry| {
        sink.lock()
            .unwrap()
            .push((entry.case_id.clone(), entry.timestamp.timestamp_millis()));
    });
    (listener, seen)
}

#[test]
fn test_assembly_scenario() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone());

    let source = VecLogSource::new(vec![
        entry("A", 10, json!("step")),
        entry("B", 5, json!("step")),
        entry("A", 20, json!("step")),
    ]);
    log.load_log(source, &PayloadEquals::new(json!("END")))
        .unwrap();

    assert_eq!(store.len(), 2);

    let a = stored_instance(&store, "A");
    assert_eq!(a.start, ts(10));
    assert_eq!(a.end, None);
    assert_eq!(
        a.entries.iter().map(|e| e.timestamp).collect::<Vec<_>>(),
        vec![ts(10), ts(20)]
    );

    let b = stored_instance(&store, "B");
    assert_eq!(b.start, ts(5));
    assert_eq!(b.end, None);
    assert_eq!(b.entries.len(), 1);
}

#[test]
fn test_reingest_overwrites_by_case_id() {
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone());

    let first = VecLogSource::new(vec![entry("A", 10, json!("v1"))]);
    log.load_log(first, &NeverEnds).unwrap();

    let second = VecLogSource::new(vec![
        entry("A", 10, json!("v2")),
        entry("A", 30, json!("v2")),
    ]);
    log.load_log(second, &NeverEnds).unwrap();

    assert_eq!(store.len(), 1);
    let a = stored_instance(&store, "A");
    assert_eq!(a.entries.len(), 2, "re-ingest replaces the instance");
    assert_eq!(a.entries[0].payload, json!("v2"));
}

#[test]
fn test_end_marker_closes_case() {
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone());

    let source = VecLogSource::new(vec![
        entry("A", 10, json!("start")),
        entry("A", 50, json!("END")),
        entry("B", 10, json!("END")),
        entry("B", 50, json!("more")),
    ]);
    log.load_log(source, &PayloadEquals::new(json!("END")))
        .unwrap();

    assert_eq!(stored_instance(&store, "A").end, Some(ts(50)));
    assert_eq!(
        stored_instance(&store, "B").end,
        None,
        "END not chronologically last leaves the case open"
    );
}

#[test]
fn test_replay_truncates_at_interval_end() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone());

    let source = VecLogSource::new(vec![
        entry("A", 5, json!("a1")),
        entry("A", 20, json!("a2")),
        entry("A", 25, json!("a3")),
        entry("B", 10, json!("b1")),
    ]);
    log.load_log(source, &NeverEnds).unwrap();

    let mut replay = log.create(TimeInterval::new(ts(0), ts(20)), IntervalCondition::Start);
    let (listener, seen) = collecting_listener();
    replay.register_listener(listener);
    replay.process_log();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("A".to_string(), 5),
            ("A".to_string(), 20),
            ("B".to_string(), 10),
        ],
        "entries past the interval end are withheld per instance"
    );
}

#[test]
fn test_replay_conditions_select_expected_cases() {
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone());

    let source = VecLogSource::new(vec![
        // started and ended inside [10, 20]
        entry("inside", 12, json!("x")),
        entry("inside", 18, json!("END")),
        // started before, never ended
        entry("open", 2, json!("x")),
        // started after the window
        entry("late", 30, json!("x")),
    ]);
    log.load_log(source, &PayloadEquals::new(json!("END")))
        .unwrap();

    let window = TimeInterval::new(ts(10), ts(20));
    for (condition, expected) in [
        (IntervalCondition::Start, vec!["inside"]),
        (IntervalCondition::Active, vec!["inside", "open"]),
        (IntervalCondition::End, vec!["inside"]),
    ] {
        let mut replay = log.create(window, condition);
        let (listener, seen) = collecting_listener();
        replay.register_listener(listener);
        replay.process_log();

        let mut cases: Vec<String> = seen.lock().unwrap().iter().map(|(c, _)| c.clone()).collect();
        cases.dedup();
        cases.sort();
        assert_eq!(cases, expected, "condition {condition}");
    }
}

#[test]
fn test_query_with_no_matches_delivers_nothing() {
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store);

    let mut replay = log.create(TimeInterval::new(ts(0), ts(10)), IntervalCondition::End);
    let (listener, seen) = collecting_listener();
    replay.register_listener(listener);
    replay.process_log();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_custom_spill_dir_is_cleaned_up() {
    let workdir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let log = CaseLog::new(store.clone()).with_spill_dir(workdir.path());

    let source = VecLogSource::new(vec![entry("A", 1, json!("x"))]);
    log.load_log(source, &NeverEnds).unwrap();

    assert_eq!(store.len(), 1);
    let leftovers: Vec<_> = std::fs::read_dir(workdir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "spill storage must be released");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Assembled instances hold exactly the pushed entries per case,
    /// ascending by timestamp.
    #[test]
    fn prop_assembly_preserves_entries(
        raw in prop::collection::vec((0usize..4, 0i64..10_000), 1..40)
    ) {
        let cases = ["a", "b", "c", "d"];
        let entries: Vec<LogEntry> = raw
            .iter()
            .enumerate()
            .map(|(i, &(case, ms))| entry(cases[case], ms, json!(i)))
            .collect();

        let mut expected: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for e in &entries {
            expected
                .entry(e.case_id.clone())
                .or_default()
                .push(e.timestamp.timestamp_millis());
        }
        for times in expected.values_mut() {
            times.sort();
        }

        let store = Arc::new(MemoryStore::new());
        let log = CaseLog::new(store.clone());
        log.load_log(VecLogSource::new(entries), &NeverEnds).unwrap();

        prop_assert_eq!(store.len(), expected.len());
        for (case, times) in &expected {
            let instance = stored_instance(&store, case);
            let got: Vec<i64> = instance
                .entries
                .iter()
                .map(|e| e.timestamp.timestamp_millis())
                .collect();
            prop_assert_eq!(&got, times, "case {}", case);
            prop_assert_eq!(instance.start.timestamp_millis(), times[0]);
            prop_assert!(instance.end.is_none());
        }
    }
}
