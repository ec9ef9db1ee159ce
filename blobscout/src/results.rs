/// Search result types.
///
/// A [`Task`] is created by the discoverer and consumed by exactly one worker,
/// which turns it into one [`ObjectResult`]. Results are moved, never shared:
/// the worker owns a result until it hands it to the collector, and the
/// collector owns it from then on. [`SearchReport`] is the collector's final,
/// key-ordered view of the run.
use rayon::slice::ParallelSliceMut;
use serde::Serialize;

/// One discovered object pending fetch and scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub bucket: String,
    pub key: String,
}

/// A single matched line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    /// The line, possibly with highlight markup inserted
    pub text: String,
    /// Characters added by highlight markup, used to correct width truncation
    pub width_adjust: usize,
}

/// All matched lines of one object, in source line order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectResult {
    pub task: Task,
    pub items: Vec<ResultItem>,
}

impl ObjectResult {
    /// A result with no matched lines
    pub fn empty(task: Task) -> Self {
        Self {
            task,
            items: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.task.key
    }

    pub fn match_count(&self) -> usize {
        self.items.len()
    }
}

/// Counters describing how a run went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Objects returned by the listing
    pub objects_listed: u64,
    /// Listed objects rejected by the object filter
    pub objects_skipped: u64,
    /// Tasks pushed onto the work queue
    pub tasks_queued: u64,
    /// Tasks that produced a result
    pub tasks_completed: u64,
    /// Tasks whose fetch or scan failed
    pub tasks_failed: u64,
    /// Workers that stopped early because a task failed
    pub workers_lost: u64,
    /// Matched lines across all results
    pub total_matches: u64,
}

impl RunStats {
    /// Tasks that were queued but neither completed nor failed
    pub fn tasks_unprocessed(&self) -> u64 {
        self.tasks_queued
            .saturating_sub(self.tasks_completed + self.tasks_failed)
    }
}

/// The complete, key-ordered outcome of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    /// Results sorted by key
    pub results: Vec<ObjectResult>,
    /// Number of results with at least one match
    pub objects_with_matches: usize,
    pub stats: RunStats,
}

impl SearchReport {
    /// Creates a new empty report
    pub fn new() -> Self {
        Default::default()
    }

    /// Buffers a result as it arrives from a worker
    pub fn add_result(&mut self, result: ObjectResult) {
        if !result.items.is_empty() {
            self.objects_with_matches += 1;
            self.stats.total_matches += result.items.len() as u64;
        }
        self.results.push(result);
    }

    /// Puts the buffered results into ascending byte order of their keys.
    ///
    /// The sort is stable, so the order does not depend on how the results
    /// arrived.
    pub fn sort_by_key(&mut self) {
        self.results
            .par_sort_by(|a, b| a.task.key.as_bytes().cmp(b.task.key.as_bytes()));
    }

    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches
    }
}
