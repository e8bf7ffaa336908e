//! Exponential-backoff retry for ingestion stages (spec §4.4): initial 1s,
//! factor 2, max 60s, cap `Config.ingestion_max_retries` attempts on
//! transient errors; permanent errors fail fast without sleeping.
//!
//! Reuses [`crate::events::JobError`]/[`crate::events::RetryPolicy`] rather
//! than inventing a parallel retry vocabulary — the scheduler's dead-letter
//! bookkeeping doesn't apply here, but the transient/permanent split and the
//! backoff shape are identical.

use std::future::Future;

use crate::config::Config;
use crate::events::{JobError, RetryPolicy};

pub fn ingest_retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.ingestion_max_retries,
        ..RetryPolicy::default()
    }
}

/// Run `stage` up to `policy.max_attempts` times, sleeping with exponential
/// backoff between transient failures. A permanent failure or the final
/// transient failure is returned as-is.
pub async fn retry_stage<F, Fut, T>(policy: &RetryPolicy, mut stage: F) -> Result<T, JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, JobError>>,
{
    let mut attempt = 0u32;
    let mut backoff = policy.initial_backoff;

    loop {
        attempt += 1;
        match stage().await {
            Ok(value) => return Ok(value),
            Err(JobError::Permanent(msg)) => return Err(JobError::Permanent(msg)),
            Err(JobError::Transient(msg)) => {
                if attempt >= policy.max_attempts {
                    return Err(JobError::Transient(msg));
                }
                tokio::time::sleep(backoff).await;
                backoff = backoff.mul_f64(policy.backoff_factor).min(policy.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy { initial_backoff: Duration::from_millis(1), max_backoff: Duration::from_millis(2), ..RetryPolicy::default() };

        let result: Result<u32, JobError> = retry_stage(&policy, || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(JobError::Transient("not yet".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_returns_immediately_without_retrying() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), JobError> = retry_stage(&policy, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(JobError::Permanent("never works".into()))
        })
        .await;

        assert!(matches!(result, Err(JobError::Permanent(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
