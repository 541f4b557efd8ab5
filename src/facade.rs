//! High-level facade over the assembly and query pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use caselog_assembler::{BulkWriter, BulkWriterConfig, FinalizePolicy, TraceAssembler};
use caselog_core::{EndMatcher, IntervalCondition, LogSource, Result, TimeInterval};
use caselog_query::IntervalLogSource;
use caselog_store::{DocumentStore, SpillLog};

/// Entry point tying the pipeline together over one document store.
///
/// `load_log` runs the full assembly pipeline: entries are spilled to
/// temporary disk storage as they stream in, finalized into instances once
/// the source is exhausted, and bulk-written to the store. `create` opens
/// the query side: a replayable source over every instance matching an
/// interval condition.
pub struct CaseLog {
    store: Arc<dyn DocumentStore>,
    bulk: BulkWriterConfig,
    policy: FinalizePolicy,
    spill_dir: Option<PathBuf>,
}

impl CaseLog {
    /// Create a facade over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        CaseLog {
            store,
            bulk: BulkWriterConfig::default(),
            policy: FinalizePolicy::default(),
            spill_dir: None,
        }
    }

    /// Override the bulk writer's batching and retry policy.
    pub fn with_bulk_config(mut self, config: BulkWriterConfig) -> Self {
        self.bulk = config;
        self
    }

    /// Override the finalization failure policy.
    pub fn with_finalize_policy(mut self, policy: FinalizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Place spill storage under `dir` instead of the system temp directory.
    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    /// Assemble `source` into per-case instances and persist them.
    ///
    /// Blocks until the source is exhausted and every buffered write has
    /// drained. Spill storage is created on demand and released before
    /// returning, whatever the outcome.
    pub fn load_log<L>(&self, source: L, end_matcher: &dyn EndMatcher) -> Result<()>
    where
        L: LogSource + Send,
    {
        let spill = match &self.spill_dir {
            Some(dir) => SpillLog::in_dir(dir)?,
            None => SpillLog::new()?,
        };
        let writer = BulkWriter::new(self.store.clone(), self.bulk.clone());
        TraceAssembler::new(spill)
            .with_policy(self.policy)
            .assemble(source, end_matcher, writer)
    }

    /// Open a replayable source over every instance matching `condition`
    /// on `interval`.
    pub fn create(&self, interval: TimeInterval, condition: IntervalCondition) -> IntervalLogSource {
        IntervalLogSource::new(self.store.clone(), interval, condition)
    }
}
