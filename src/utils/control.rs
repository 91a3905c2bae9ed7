//! Cooperative cancellation and deadlines for a scan

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation token wrapping a shared `AtomicBool`.
///
/// Clones share the flag, so a caller can keep one clone and hand another
/// to the scan.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Why a scan stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Token plus optional deadline, checked at every suspension point
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ScanControl {
    pub fn new(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now, keeping an earlier one if set. A timeout
    /// too large to represent as an instant sets no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return self,
        };
        match self.deadline {
            Some(existing) if existing <= deadline => self,
            _ => self.with_deadline(deadline),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// `Some` once the token is cancelled or the deadline has passed
    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.token.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::TimedOut),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let control = ScanControl::new(token.clone());
        assert_eq!(control.interrupted(), None);
        token.cancel();
        assert_eq!(control.interrupted(), Some(Interrupt::Cancelled));
    }

    #[test]
    fn test_elapsed_deadline() {
        let control = ScanControl::default().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(control.interrupted(), Some(Interrupt::TimedOut));
    }

    #[test]
    fn test_with_timeout_keeps_earlier_deadline() {
        let early = Instant::now() - Duration::from_millis(1);
        let control = ScanControl::default().with_deadline(early).with_timeout(Duration::from_secs(60));
        assert_eq!(control.interrupted(), Some(Interrupt::TimedOut));
    }

    #[test]
    fn test_unrepresentable_timeout_sets_no_deadline() {
        let control = ScanControl::default().with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(control.interrupted(), None);
    }
}
