//! Accumulation and finalization of case traces.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use caselog_core::{EndMatcher, Error, LogEntry, LogInstance, LogSource, Result};
use caselog_store::SpillStore;
use tracing::{info, warn};

use crate::bulk::BulkWriter;

/// What to do when a case fails to decode during finalization.
///
/// Accumulation always drops a single bad entry and moves on; finalization
/// is where the policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalizePolicy {
    /// Abort the remaining finalization loop on the first failing case.
    /// Cases not yet exported are lost for this run.
    #[default]
    FailFast,
    /// Skip the failing case and keep exporting the rest.
    SkipCase,
}

/// Assembles a raw entry stream into per-case instances.
///
/// The assembler owns a [`SpillStore`] for the duration of one run. Entries
/// are accumulated as they arrive; once the source is exhausted every case
/// is finalized (entries sorted, start/end markers computed) and handed to
/// the bulk writer. Cleanup runs on every exit path: the writer is drained
/// and closed, then the spill storage is released.
pub struct TraceAssembler<S: SpillStore> {
    spill: S,
    policy: FinalizePolicy,
    channel_capacity: usize,
}

impl<S: SpillStore> TraceAssembler<S> {
    /// Create an assembler accumulating into `spill`.
    pub fn new(spill: S) -> Self {
        TraceAssembler {
            spill,
            policy: FinalizePolicy::default(),
            channel_capacity: 1024,
        }
    }

    /// Set the finalization failure policy.
    pub fn with_policy(mut self, policy: FinalizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the capacity of the ingestion channel. A full channel blocks the
    /// log source until the accumulator catches up.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Drive `source` to completion, assemble every case, and write the
    /// finished instances through `writer`.
    ///
    /// The source runs on its own thread and feeds a bounded channel; the
    /// calling thread accumulates. Consumes the assembler: the spill storage
    /// is released before returning, whatever the outcome.
    pub fn assemble<L>(
        mut self,
        mut source: L,
        end_matcher: &dyn EndMatcher,
        writer: BulkWriter,
    ) -> Result<()>
    where
        L: LogSource + Send,
    {
        let started = Instant::now();
        let (tx, rx) = mpsc::sync_channel::<LogEntry>(self.channel_capacity);

        thread::scope(|scope| {
            scope.spawn(move || {
                source.register_listener(Box::new(move |entry| {
                    // A dropped receiver ends delivery early.
                    let _ = tx.send(entry);
                }));
                source.process_log();
            });

            for entry in rx {
                self.accumulate(entry);
            }
        });

        info!(
            cases = self.spill.case_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished processing log"
        );

        let outcome = self.export(end_matcher, &writer);
        writer.close();
        drop(self.spill);
        outcome
    }

    fn accumulate(&mut self, entry: LogEntry) {
        match serde_json::to_vec(&entry) {
            Ok(blob) => {
                if let Err(e) = self.spill.append(&entry.case_id, &blob) {
                    warn!(case = %entry.case_id, error = %e, "spill append failed; entry dropped");
                }
            }
            Err(e) => {
                warn!(case = %entry.case_id, error = %e, "entry encoding failed; entry dropped");
            }
        }
    }

    fn export(&self, end_matcher: &dyn EndMatcher, writer: &BulkWriter) -> Result<()> {
        let mut exported = 0usize;
        for case_id in self.spill.case_ids() {
            let result = self
                .finalize_case(&case_id, end_matcher)
                .and_then(|instance| writer.add(&instance));
            match result {
                Ok(()) => exported += 1,
                Err(e) => match self.policy {
                    FinalizePolicy::FailFast => {
                        warn!(
                            case = %case_id,
                            error = %e,
                            "finalization aborted; remaining cases not exported"
                        );
                        return Err(e);
                    }
                    FinalizePolicy::SkipCase => {
                        warn!(case = %case_id, error = %e, "case skipped during finalization");
                    }
                },
            }
        }
        info!(instances = exported, "export complete");
        Ok(())
    }

    fn finalize_case(&self, case_id: &str, end_matcher: &dyn EndMatcher) -> Result<LogInstance> {
        let blobs = self.spill.read(case_id)?;
        let mut entries = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            let entry: LogEntry = serde_json::from_slice(blob)
                .map_err(|e| Error::Serialization(format!("case {case_id}: {e}")))?;
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err(Error::Storage(format!("case {case_id} has no entries")));
        }
        entries.sort_by_key(|e| e.timestamp);

        let start = entries[0].timestamp;
        let last = &entries[entries.len() - 1];
        let end = end_matcher.matches(last).then(|| last.timestamp);

        Ok(LogInstance {
            case_id: case_id.to_string(),
            start,
            end,
            entries,
        })
    }
}
