//! Monitoring-data collection and async-job reconciliation.
//!
//! For a user's keywords the [`orchestrator`] fans out one [`collector`] per
//! keyword. Each collector fetches news and drives one social-search job
//! through a bounded short-poll ([`tracker`]). Jobs that outlive the poll
//! budget are recorded as `TIMED_OUT` markers, which the [`sweeper`] re-checks
//! on later invocations. [`service`] ties both paths to a [`MonitoringStore`]
//! and takes the store's per-user writer lease around every pass.

pub mod collector;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod tracker;

#[cfg(test)]
mod fakes;

pub use collector::collect_keyword;
pub use error::PipelineError;
pub use orchestrator::{collect_all, CollectOptions, CollectionSummary};
pub use service::{CollectionReport, MonitoringService, ReconcileOutcome, SweepTotals};
pub use store::{
    MemoryStore, MonitoringStore, RunType, StoreError, UserLockGuard, UserLocks, WriterLease,
};
pub use sweeper::reconcile;
pub use tracker::{track_job, JobOutcome, PollPolicy};
