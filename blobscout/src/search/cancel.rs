use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How long a blocked handoff waits before re-checking for cancellation
pub(crate) const HANDOFF_POLL: Duration = Duration::from_millis(100);

/// Cancellation scope shared by the discoverer and every worker of one run.
///
/// Cancellation is cooperative: it is observed at queue handoffs, never
/// in the middle of a fetch.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_sticky() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
