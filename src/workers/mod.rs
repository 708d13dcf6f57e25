//! Scheduled background jobs. Only the leader instance runs them; the
//! schedule itself is data (`planned_jobs`) so tests can assert on it
//! without starting a scheduler.

pub mod adapter_probe;
pub mod cache_cleanup;
pub mod daily_aggregation;

use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::WorkerConfig;
use crate::state::AppState;

/// Bound on how long shutdown waits for the scheduler to drain.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerName {
    DailyAggregation,
    AdapterProbe,
    CacheCleanup,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DailyAggregation => "daily_aggregation",
            Self::AdapterProbe => "adapter_probe",
            Self::CacheCleanup => "cache_cleanup",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JobSpec {
    pub name: WorkerName,
    /// Six-field cron expression, seconds first, evaluated in UTC.
    pub schedule: &'static str,
}

pub fn planned_jobs(config: &WorkerConfig) -> Vec<JobSpec> {
    let mut jobs = vec![
        JobSpec {
            name: WorkerName::DailyAggregation,
            schedule: "0 0 1 * * *",
        },
        JobSpec {
            name: WorkerName::CacheCleanup,
            schedule: "0 */10 * * * *",
        },
    ];
    if config.enable_adapter_probe {
        jobs.push(JobSpec {
            name: WorkerName::AdapterProbe,
            schedule: "0 * * * * *",
        });
    }
    jobs
}

pub struct WorkerManager {
    scheduler: JobScheduler,
}

impl WorkerManager {
    pub async fn start(state: AppState) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;

        for spec in planned_jobs(&state.config.worker) {
            let job_state = state.clone();
            let job = Job::new_async(spec.schedule, move |_uuid, _lock| {
                let state = job_state.clone();
                Box::pin(async move {
                    run_job(spec.name, &state).await;
                })
            })?;
            scheduler.add(job).await?;
            tracing::info!(worker = spec.name.as_str(), schedule = spec.schedule, "Worker scheduled");
        }

        scheduler.start().await?;
        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) {
        let drain = self.scheduler.shutdown();
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
            tracing::warn!("Worker scheduler did not drain in time");
        }
    }
}

async fn run_job(name: WorkerName, state: &AppState) {
    tracing::debug!(worker = name.as_str(), "Worker tick");
    let result = match name {
        WorkerName::DailyAggregation => daily_aggregation::run(state).await,
        WorkerName::AdapterProbe => adapter_probe::run(state).await,
        WorkerName::CacheCleanup => cache_cleanup::run(state).await,
    };
    if let Err(error) = result {
        tracing::error!(worker = name.as_str(), %error, "Worker run failed");
    }
}
