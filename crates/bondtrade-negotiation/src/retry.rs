//! Bounded repetition of operations that lost a store race.

use bondtrade_types::Result;

/// Re-runs a full read-modify-write operation while it fails with a
/// retryable error (a store version conflict), up to `max_retries` extra
/// attempts. Every other error is returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCoordinator {
    max_retries: u32,
}

impl RetryCoordinator {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `op` until it succeeds, fails terminally, or retries run out.
    ///
    /// `op` must re-read the ledger on each call.
    pub fn run<R>(&self, operation: &str, mut op: impl FnMut() -> Result<R>) -> Result<R> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max = self.max_retries,
                        error = %err,
                        "Retrying after store conflict"
                    );
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondtrade_types::BondtradeError;

    fn conflict() -> BondtradeError {
        BondtradeError::StoreConflict {
            key: "ledger".into(),
            expected: 1,
            actual: 2,
        }
    }

    #[test]
    fn retries_conflicts_then_succeeds() {
        let retry = RetryCoordinator::new(3);
        let mut calls = 0;
        let out = retry
            .run("test", || {
                calls += 1;
                if calls < 3 { Err(conflict()) } else { Ok(calls) }
            })
            .unwrap();
        assert_eq!(out, 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let retry = RetryCoordinator::new(2);
        let mut calls = 0;
        let err = retry
            .run("test", || -> Result<()> {
                calls += 1;
                Err(conflict())
            })
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(calls, 3);
    }

    #[test]
    fn terminal_errors_are_not_retried() {
        let retry = RetryCoordinator::new(5);
        let mut calls = 0;
        let err = retry
            .run("test", || -> Result<()> {
                calls += 1;
                Err(BondtradeError::unauthorized("nope"))
            })
            .unwrap_err();
        assert!(matches!(err, BondtradeError::Unauthorized { .. }));
        assert_eq!(calls, 1);
    }
}
