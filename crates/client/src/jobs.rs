//! The asynchronous job protocol.
//!
//! Mutating requests are accepted by the service immediately and answered
//! with a [`JobStatus`]. The runner submits the request, polls
//! `jobStatus/{id}/` until the job is terminal, and (for flows that produce an
//! object) fetches the object behind `_links.managedObject`.
//!
//! ```text
//! Submitted ──► Polling ──► Succeeded ──► (resolve)
//!                  │  ▲
//!                  │  └── sleep(poll_interval)
//!                  ├──► Failed
//!                  └──► TimedOut
//! ```
//!
//! At least one status fetch always happens, even when the submission
//! response already carries a terminal state. The runner never retries.

use std::time::Duration;

use ipam::{
    ApiRequest, ApiTransport, IpamError, JobId, JobStatus, ResourceType, ServiceConfig, Timestamp,
};
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::accessors::Accessor;

/// Delay between two status fetches of a non-terminal job.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Budget for one job, measured from submission.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(3_600_000);

/// Name of the hyperlink pointing at the object a job produced.
pub const MANAGED_OBJECT_LINK: &str = "managedObject";

/// Poll cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            timeout: POLL_TIMEOUT,
        }
    }
}

/// Lifecycle phase of one job as seen by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobPhase::Submitted => "submitted",
            JobPhase::Polling => "polling",
            JobPhase::Succeeded => "succeeded",
            JobPhase::Failed => "failed",
            JobPhase::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// How a successful job went.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// The terminal status as last fetched.
    pub status: JobStatus,
    /// Number of `jobStatus` fetches issued.
    pub polls: u32,
    pub submitted_at: Timestamp,
    pub finished_at: Timestamp,
    /// Time from submission to the terminal fetch.
    pub elapsed: Duration,
}

/// An object produced by a job, together with the job's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<R> {
    pub object: R,
    pub outcome: JobOutcome,
}

/// Drives one job at a time through submit, poll, and resolve.
pub struct JobRunner<'a, T: ?Sized> {
    accessor: Accessor<'a, T>,
    config: &'a ServiceConfig,
    policy: JobPolicy,
}

impl<'a, T: ApiTransport + ?Sized> JobRunner<'a, T> {
    pub fn new(transport: &'a T, config: &'a ServiceConfig, policy: JobPolicy) -> Self {
        Self {
            accessor: Accessor::new(transport, config),
            config,
            policy,
        }
    }

    /// Submits `request` and waits for the job to finish.
    ///
    /// # Errors
    ///
    /// - Submission or status fetch failures are returned as is.
    /// - [`IpamError::JobFailed`] when the job ends `Failed`.
    /// - [`IpamError::JobTimedOut`] when the budget runs out first.
    pub async fn run(&self, request: &ApiRequest) -> Result<JobOutcome, IpamError> {
        let submitted_at = Timestamp::now();
        let started = Instant::now();

        let submitted: JobStatus = self.accessor.send_json(request).await?;
        info!(
            job_id = %submitted.id,
            job_type = submitted.job_type.as_deref().unwrap_or_default(),
            job_state = %submitted.job_state,
            phase = %JobPhase::Submitted,
            "Job accepted"
        );

        let (status, polls) = self.wait(submitted.id, started).await?;

        if let Some(err) = status.failure() {
            warn!(
                job_id = %status.id,
                polls,
                phase = %JobPhase::Failed,
                error = %err,
                "Job failed"
            );
            return Err(err);
        }

        info!(
            job_id = %status.id,
            polls,
            phase = %JobPhase::Succeeded,
            "Job completed"
        );
        Ok(JobOutcome {
            status,
            polls,
            submitted_at,
            finished_at: Timestamp::now(),
            elapsed: started.elapsed(),
        })
    }

    /// Runs the job, then fetches the object it produced as `R`.
    ///
    /// # Errors
    ///
    /// Everything [`run`](Self::run) returns, plus [`IpamError::MissingLink`]
    /// when the successful job has no `managedObject` link.
    pub async fn run_and_resolve<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Resolved<R>, IpamError> {
        let outcome = self.run(request).await?;
        let href = outcome
            .status
            .managed_object_href()
            .ok_or(IpamError::MissingLink {
                job_id: outcome.status.id,
                link: MANAGED_OBJECT_LINK,
            })?;
        let url = self.config.url_from_href(href);
        debug!(job_id = %outcome.status.id, url = %url, "Resolving managed object");

        let object = self.accessor.get_url(url).await?;
        Ok(Resolved { object, outcome })
    }

    /// Fetches the status until it is terminal. Returns the terminal status
    /// and the number of fetches.
    async fn wait(&self, job_id: JobId, started: Instant) -> Result<(JobStatus, u32), IpamError> {
        let mut polls = 0u32;
        loop {
            let status: JobStatus = self
                .accessor
                .get_by_id(ResourceType::JobStatus, job_id)
                .await?;
            polls += 1;
            debug!(
                job_id = %job_id,
                job_state = %status.job_state,
                polls,
                phase = %JobPhase::Polling,
                "Polled job status"
            );
            if status.job_state.is_terminal() {
                return Ok((status, polls));
            }

            sleep(self.policy.poll_interval).await;

            let elapsed = started.elapsed();
            if elapsed > self.policy.timeout {
                warn!(
                    job_id = %job_id,
                    polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    phase = %JobPhase::TimedOut,
                    "Gave up waiting for job"
                );
                return Err(IpamError::JobTimedOut { job_id, elapsed });
            }
        }
    }
}
