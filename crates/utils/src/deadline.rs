//! Racing an operation against a deadline
//!
//! [`race`] only reports which side finished first. It never cancels or
//! cleans up the losing operation: on expiry the still-pending operation is
//! handed back and the caller decides whether to terminate, drain or drop it.

use futures::future::{self, Either};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Result of [`race`]
pub enum Raced<F: Future> {
    /// The operation finished before the deadline
    Settled(F::Output),
    /// The deadline elapsed first; the operation has not completed
    Expired(Pin<Box<F>>),
}

impl<F: Future> std::fmt::Debug for Raced<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Raced::Settled(_) => f.write_str("Settled(..)"),
            Raced::Expired(_) => f.write_str("Expired(..)"),
        }
    }
}

/// Run `operation` and a timer of `limit` concurrently; resolve to whichever
/// completes first. When both are ready on the same poll the operation wins.
pub async fn race<F: Future>(operation: F, limit: Duration) -> Raced<F> {
    let operation = Box::pin(operation);
    let timer = Box::pin(tokio::time::sleep(limit));

    match future::select(operation, timer).await {
        Either::Left((output, _timer)) => Raced::Settled(output),
        Either::Right(((), pending)) => Raced::Expired(pending),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_operation_before_deadline_settles() {
        let raced = race(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "done"
            },
            Duration::from_millis(100),
        )
        .await;

        match raced {
            Raced::Settled(value) => assert_eq!(value, "done"),
            Raced::Expired(_) => panic!("operation should have won"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_operation_expires_at_deadline() {
        let start = Instant::now();
        let raced = race(std::future::pending::<()>(), Duration::from_millis(250)).await;

        assert!(matches!(raced, Raced::Expired(_)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_millis(260));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_operation_is_handed_back_uncancelled() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let raced = race(
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                flag.store(true, Ordering::SeqCst);
                7
            },
            Duration::from_millis(10),
        )
        .await;

        let Raced::Expired(pending) = raced else {
            panic!("deadline should have won");
        };
        assert!(!finished.load(Ordering::SeqCst));

        // the loser keeps its progress and can still be driven to completion
        assert_eq!(pending.await, 7);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_operation_wins_zero_deadline() {
        let raced = race(async { 1 }, Duration::ZERO).await;
        assert!(matches!(raced, Raced::Settled(1)));
    }
}
