use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use tracing::{debug, trace, warn};

use super::cancel::{CancelToken, HANDOFF_POLL};
use crate::config::{FailurePolicy, OutputMode, SearchPlan};
use crate::decompress::{open_decompressed, Compression, ObjectLines};
use crate::errors::{SearchError, SearchResult};
use crate::results::{ObjectResult, Task};
use crate::store::ObjectStore;

/// Counters kept by one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Set when the worker stopped early because a task failed
    pub stopped_on_failure: bool,
}

/// Fetches, decompresses and scans one object.
///
/// In keys-only mode nothing is fetched and the result is empty.
pub fn process_task(
    store: &dyn ObjectStore,
    plan: &SearchPlan,
    task: Task,
) -> SearchResult<ObjectResult> {
    if plan.output_mode == OutputMode::KeysOnly {
        return Ok(ObjectResult::empty(task));
    }

    trace!("Fetching {}", task.key);
    let body = store.get_object(&task.bucket, &task.key)?;
    let reader = open_decompressed(&task.key, body)?;

    let compressed = Compression::from_key(&task.key) != Compression::None;
    let mut result = ObjectResult::empty(task);
    for line in ObjectLines::new(reader) {
        let line = line.map_err(|e| {
            if compressed {
                SearchError::decompress_failed(&result.task.key, e)
            } else {
                SearchError::fetch_failed(&result.task.key, e)
            }
        })?;
        if let Some(item) = plan.matcher.match_line(&line) {
            result.items.push(item);
        }
    }

    trace!("Found {} matches in {}", result.items.len(), result.task.key);
    Ok(result)
}

/// Drains the task queue until it is closed and empty.
///
/// A task that fails is logged with its key. Under [`FailurePolicy::StopWorker`]
/// the worker then exits, leaving the remaining tasks to the rest of the pool;
/// under [`FailurePolicy::Continue`] it moves on to the next task. Failed
/// tasks never fail the run. Observing cancellation at a handoff returns
/// [`SearchError::Cancelled`].
pub fn run_worker(
    id: usize,
    store: &dyn ObjectStore,
    plan: &SearchPlan,
    tasks: Receiver<Task>,
    results: Sender<ObjectResult>,
    cancel: &CancelToken,
) -> SearchResult<WorkerStats> {
    let mut stats = WorkerStats::default();

    while let Some(task) = next_task(&tasks, cancel)? {
        let key = task.key.clone();
        match process_task(store, plan, task) {
            Ok(result) => {
                send_result(&results, result, cancel)?;
                stats.tasks_completed += 1;
            }
            Err(e) => {
                warn!("worker {} error searching {}: {}", id, key, e);
                stats.tasks_failed += 1;
                if plan.failure_policy == FailurePolicy::StopWorker {
                    stats.stopped_on_failure = true;
                    debug!("worker {} stopping after failed task", id);
                    return Ok(stats);
                }
            }
        }
    }

    debug!(
        "worker {} finished: {} completed, {} failed",
        id, stats.tasks_completed, stats.tasks_failed
    );
    Ok(stats)
}

/// Waits for the next task; `None` once the queue is closed and drained.
fn next_task(tasks: &Receiver<Task>, cancel: &CancelToken) -> SearchResult<Option<Task>> {
    loop {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        match tasks.recv_timeout(HANDOFF_POLL) {
            Ok(task) => return Ok(Some(task)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        }
    }
}

fn send_result(
    results: &Sender<ObjectResult>,
    result: ObjectResult,
    cancel: &CancelToken,
) -> SearchResult<()> {
    let mut pending = result;
    loop {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        match results.send_timeout(pending, HANDOFF_POLL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(returned)) => pending = returned,
            // The collector only goes away when the run is being torn down
            Err(SendTimeoutError::Disconnected(_)) => return Err(SearchError::Cancelled),
        }
    }
}
