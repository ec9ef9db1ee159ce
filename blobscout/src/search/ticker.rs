use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::info;

pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Logs the depth of `queue` every `interval` while it is non-empty.
///
/// Only reads the queue length, never takes from it. Returns once `stop` is
/// signalled or disconnected, dropping its handle on the queue. Returns the
/// number of depth reports logged.
pub fn run_queue_ticker<T>(queue: Receiver<T>, stop: Receiver<()>, interval: Duration) -> u64 {
    let mut reports = 0;
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let depth = queue.len();
                if depth > 0 {
                    info!("tasks remaining: {}", depth);
                    reports += 1;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return reports,
        }
    }
}
