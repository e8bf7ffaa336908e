//! Event Bus & Scheduler (C11, spec §4.11): in-process pub/sub plus a
//! bounded-concurrency background job runner and its four periodic tasks.

mod bus;
mod jobs;
mod scheduler;

pub use bus::{EmitOutcome, EventBus, EventHandler, EventHandlerError, EventName, EventPayload, FnHandler};
pub use jobs::{CitationResolutionJob, DegradationScanJob, OutlierDetectionJob, PageRankRecomputationJob};
pub use scheduler::{spawn_periodic, DeadLetter, Job, JobError, RetryPolicy, Scheduler};
