/// The concurrent search pipeline.
///
/// ```text
///  Discoverer            Workers (N)                  Collector
///  ──────────            ───────────                  ─────────
///  list_page()
///      ↓
///  ObjectFilter
///      ↓
///  bounded task queue ──→ get_object()
///  (backpressure)         open_decompressed()
///                         ObjectLines + ContentMatcher
///                              ↓
///                         result channel ──────────→ buffer every result
///                                                    sort by key
///                                                    SearchReport
/// ```
///
/// # Ordering
///
/// Workers finish in whatever order their fetches complete. The only ordering
/// the pipeline promises is the collector's final sort by key, plus the source
/// line order inside each result.
///
/// # Failure handling
///
/// - A listing error is fatal: the shared [`CancelToken`] is tripped, every
///   thread winds down at its next queue handoff and no report is produced.
/// - A fetch or decompression error affects only its own object. It is logged,
///   and the worker either exits or keeps going depending on the configured
///   [`FailurePolicy`](crate::config::FailurePolicy).
/// - If every worker is gone while tasks are still queued, the run fails
///   rather than silently dropping them.
pub mod cancel;
pub mod discover;
pub mod engine;
pub mod matcher;
pub mod ticker;
pub mod worker;

pub use cancel::CancelToken;
pub use engine::{run, run_with_cancel, search};
pub use matcher::{ContentMatcher, MatchStyle};
