use crossbeam_channel::bounded;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::cancel::CancelToken;
use super::discover::{discover, DiscoveryStats};
use super::ticker::{run_queue_ticker, TICK_INTERVAL};
use super::worker::{run_worker, WorkerStats};
use crate::config::{SearchConfig, SearchPlan};
use crate::errors::{SearchError, SearchResult};
use crate::results::{ObjectResult, SearchReport, Task};
use crate::store::ObjectStore;

/// Validates `config` and runs a search against `store`
pub fn search(config: &SearchConfig, store: &dyn ObjectStore) -> SearchResult<SearchReport> {
    let plan = config.validate()?;
    run(&plan, store)
}

/// Runs a search with a fresh cancellation scope
pub fn run(plan: &SearchPlan, store: &dyn ObjectStore) -> SearchResult<SearchReport> {
    run_with_cancel(plan, store, &CancelToken::new())
}

/// Runs the discoverer and `plan.workers` workers concurrently and collects
/// their results into a key-ordered report.
///
/// All threads share `cancel`. A fatal discovery error trips it, so the
/// workers stop at their next handoff; the result channel closes once every
/// worker has exited and only then is the outcome decided. Tripping `cancel`
/// from outside aborts the run with [`SearchError::Cancelled`].
pub fn run_with_cancel(
    plan: &SearchPlan,
    store: &dyn ObjectStore,
    cancel: &CancelToken,
) -> SearchResult<SearchReport> {
    let started = Instant::now();
    info!(
        "Starting search of bucket '{}' under prefix '{}' with {} workers",
        plan.bucket, plan.prefix, plan.workers
    );

    let (task_tx, task_rx) = bounded::<Task>(plan.queue_capacity);
    let (result_tx, result_rx) = bounded::<ObjectResult>(plan.result_capacity);

    let (mut report, discovery, workers) = thread::scope(|s| {
        let discoverer = s.spawn(move || {
            let outcome = discover(store, plan, task_tx, cancel);
            if let Err(e) = &outcome {
                if e.is_fatal() {
                    cancel.cancel();
                }
            }
            outcome
        });

        let workers: Vec<_> = (0..plan.workers)
            .map(|id| {
                let tasks = task_rx.clone();
                let results = result_tx.clone();
                s.spawn(move || run_worker(id, store, plan, tasks, results, cancel))
            })
            .collect();

        let ticker = plan.queue_ticker.then(|| {
            let (stop_tx, stop_rx) = bounded::<()>(0);
            let queue = task_rx.clone();
            let handle = s.spawn(move || run_queue_ticker(queue, stop_rx, TICK_INTERVAL));
            (stop_tx, handle)
        });

        // Only the spawned threads may hold channel ends from here on
        drop(task_rx);
        drop(result_tx);

        // Closed once every worker has exited
        let mut report = SearchReport::new();
        for result in result_rx.iter() {
            report.add_result(result);
        }

        // The ticker's handle on the task queue must go before joining the
        // discoverer, or a discoverer blocked on a full queue would never see
        // that the workers are gone
        if let Some((stop_tx, handle)) = ticker {
            drop(stop_tx);
            let _ = handle.join();
        }

        let workers: Vec<thread::Result<SearchResult<WorkerStats>>> =
            workers.into_iter().map(|h| h.join()).collect();
        let discovery = discoverer.join();
        (report, discovery, workers)
    });

    let discovery = match discovery {
        Ok(Ok(stats)) => stats,
        Ok(Err(SearchError::WorkersExhausted { pending: discovered })) => {
            let finished: u64 = workers
                .iter()
                .filter_map(|w| match w {
                    Ok(Ok(stats)) => Some(stats.tasks_completed + stats.tasks_failed),
                    _ => None,
                })
                .sum();
            let pending = discovered.saturating_sub(finished);
            error!("{} discovered objects were never searched", pending);
            return Err(SearchError::WorkersExhausted { pending });
        }
        Ok(Err(e)) => {
            if !matches!(e, SearchError::Cancelled) {
                error!("Search aborted: {}", e);
            }
            return Err(e);
        }
        Err(_) => {
            error!("Discovery thread panicked");
            return Err(SearchError::WorkerPanicked);
        }
    };
    record_discovery(&mut report, &discovery);

    for (id, outcome) in workers.into_iter().enumerate() {
        match outcome {
            Ok(Ok(stats)) => record_worker(&mut report, &stats),
            Ok(Err(SearchError::Cancelled)) => {
                debug!("worker {} observed cancellation", id);
                return Err(SearchError::Cancelled);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                error!("worker {} panicked", id);
                return Err(SearchError::WorkerPanicked);
            }
        }
    }

    if report.stats.workers_lost > 0 {
        warn!(
            "{} of {} workers stopped after a failed task",
            report.stats.workers_lost, plan.workers
        );
    }
    let pending = report.stats.tasks_unprocessed();
    if pending > 0 {
        error!("{} discovered objects were never searched", pending);
        return Err(SearchError::WorkersExhausted { pending });
    }

    report.sort_by_key();

    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
    info!(
        "Search complete in {}: {} matches in {} objects ({} searched, {} failed, {} skipped)",
        humantime::format_duration(elapsed),
        report.total_matches(),
        report.objects_with_matches,
        report.stats.tasks_completed,
        report.stats.tasks_failed,
        report.stats.objects_skipped
    );

    Ok(report)
}

fn record_discovery(report: &mut SearchReport, discovery: &DiscoveryStats) {
    report.stats.objects_listed = discovery.objects_listed;
    report.stats.objects_skipped = discovery.objects_skipped;
    report.stats.tasks_queued = discovery.tasks_queued;
}

fn record_worker(report: &mut SearchReport, stats: &WorkerStats) {
    report.stats.tasks_completed += stats.tasks_completed;
    report.stats.tasks_failed += stats.tasks_failed;
    if stats.stopped_on_failure {
        report.stats.workers_lost += 1;
    }
}
