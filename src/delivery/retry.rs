// Bounded retry for record delivery
// Fixed delay between attempts, no backoff, no queue: a record that still
// fails after the last attempt is dropped by the caller.

use std::time::Duration;

use super::client::{DeliveryError, RecordSink};
use crate::contact::ContactRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (always at least 1)
    pub attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no waiting
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Deliver a record, retrying on failure.
///
/// Returns the number of attempts used on success, or the last error once
/// every attempt has failed.
pub async fn deliver_with_retry<S: RecordSink>(
    sink: &S,
    record: &ContactRecord,
    policy: &RetryPolicy,
) -> Result<u32, DeliveryError> {
    let mut attempt = 1;
    loop {
        match sink.deliver(record).await {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt >= policy.attempts => return Err(e),
            Err(e) => {
                log::warn!(
                    "Attempt {}/{} for {} failed ({}), retry in {:.1} seconds...",
                    attempt,
                    policy.attempts,
                    record.contacted_callsign,
                    e,
                    policy.delay.as_secs_f64()
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then accepts
    struct FlakySink {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakySink {
        fn new(failures: u32) -> Self {
            Self { failures, calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RecordSink for FlakySink {
        async fn deliver(&self, _record: &ContactRecord) -> Result<(), DeliveryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(DeliveryError::Rejected { status: 503, body: String::new() })
            } else {
                Ok(())
            }
        }
    }

    fn record() -> ContactRecord {
        crate::contact::Normalizer::new(Some("K1ABC".to_string()))
            .normalize("<CALL:4>W1AW<QSO_DATE:8>20240101<TIME_ON:4>1200")
            .unwrap()
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let sink = FlakySink::new(2);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let attempts = deliver_with_retry(&sink, &record(), &policy).await.unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(sink.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_configured_attempts() {
        let sink = FlakySink::new(10);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = deliver_with_retry(&sink, &record(), &policy).await;
        assert!(matches!(result, Err(DeliveryError::Rejected { status: 503, .. })));
        assert_eq!(sink.calls(), 3);
    }

    #[tokio::test]
    async fn test_first_success_makes_one_call() {
        let sink = FlakySink::new(0);
        let attempts = deliver_with_retry(&sink, &record(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn test_delay_applied_between_attempts() {
        let sink = FlakySink::new(1);
        let policy = RetryPolicy::new(2, Duration::from_millis(50));

        let started = std::time::Instant::now();
        deliver_with_retry(&sink, &record(), &policy).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_zero_attempts_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
        assert_eq!(RetryPolicy::once().attempts, 1);
    }
}
