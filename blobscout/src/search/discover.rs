use crossbeam_channel::{SendTimeoutError, Sender};
use tracing::{debug, error, trace};

use super::cancel::{CancelToken, HANDOFF_POLL};
use crate::config::SearchPlan;
use crate::errors::{SearchError, SearchResult};
use crate::results::Task;
use crate::store::ObjectStore;

/// Counters kept by the discoverer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub pages: u64,
    pub objects_listed: u64,
    pub objects_skipped: u64,
    pub tasks_queued: u64,
}

/// Pages through the listing under the plan's prefix and queues every object
/// the filter accepts.
///
/// Pushing blocks while the queue is full. The queue is closed when `tasks`
/// is dropped, which happens on every return path. A listing failure is
/// returned as-is so the orchestrator can abort the run; nothing discovered
/// so far is treated as a valid partial result.
///
/// If every worker is gone before discovery ends, this returns
/// [`SearchError::WorkersExhausted`] whose `pending` counts every task
/// discovered so far, including the one that could not be queued. Only the
/// orchestrator knows how many of those the workers finished, so it narrows
/// the count before reporting it.
pub fn discover(
    store: &dyn ObjectStore,
    plan: &SearchPlan,
    tasks: Sender<Task>,
    cancel: &CancelToken,
) -> SearchResult<DiscoveryStats> {
    let mut stats = DiscoveryStats::default();
    let mut start_after: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let page = store
            .list_page(
                &plan.bucket,
                &plan.prefix,
                start_after.as_deref(),
                plan.page_size,
            )
            .map_err(|e| {
                error!("Error listing objects under '{}': {}", plan.prefix, e);
                match e {
                    SearchError::ListFailed { .. } => e,
                    other => SearchError::list_failed(&plan.prefix, other),
                }
            })?;
        stats.pages += 1;

        let mut queued_from_page = 0;
        for object in &page.objects {
            stats.objects_listed += 1;
            if !plan.filter.should_process(&object.key, object.size) {
                trace!("Skipping {} ({} bytes)", object.key, object.size);
                stats.objects_skipped += 1;
                continue;
            }

            let task = Task {
                bucket: plan.bucket.clone(),
                key: object.key.clone(),
            };
            send_task(&tasks, task, cancel, &stats)?;
            stats.tasks_queued += 1;
            queued_from_page += 1;
        }
        debug!(
            "Listed page {}: {} objects, {} queued",
            stats.pages,
            page.objects.len(),
            queued_from_page
        );

        match page.next_start_after {
            Some(next) => start_after = Some(next),
            None => break,
        }
    }

    debug!(
        "Discovery complete: {} objects listed, {} queued",
        stats.objects_listed, stats.tasks_queued
    );
    Ok(stats)
}

/// Pushes one task, waiting in short slices so cancellation is noticed while the queue is full.
fn send_task(
    tasks: &Sender<Task>,
    task: Task,
    cancel: &CancelToken,
    stats: &DiscoveryStats,
) -> SearchResult<()> {
    let mut pending = task;
    loop {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        match tasks.send_timeout(pending, HANDOFF_POLL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(returned)) => pending = returned,
            Err(SendTimeoutError::Disconnected(_)) => {
                // Every worker has exited
                debug!("No workers remain after {} queued tasks", stats.tasks_queued);
                return Err(SearchError::WorkersExhausted {
                    pending: stats.tasks_queued.saturating_add(1),
                });
            }
        }
    }
}
