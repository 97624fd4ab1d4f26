use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use models::{fetch_job::NewFetchJobScheduleBuilder, FetchJobSchedule};
use store::Store;
use tracing::info;
use types::JobStatus;

pub const PRICES_JOB: &str = "fetch_prices";
pub const PRICES_INTERVAL_SECONDS: i32 = 300;
pub const HISTORY_JOB: &str = "fetch_historical";
pub const HISTORY_INTERVAL_SECONDS: i32 = 86_400;

/// Bookkeeping of one job execution in `fetch_job_schedules`. Counters are
/// carried over from the stored row.
pub struct JobRun<'a> {
    store: &'a dyn Store,
    name: &'static str,
    interval_seconds: i32,
    started_at: DateTime<Utc>,
    previous: Option<FetchJobSchedule>,
}

impl<'a> JobRun<'a> {
    pub fn start(
        store: &'a dyn Store,
        name: &'static str,
        interval_seconds: i32,
    ) -> anyhow::Result<Self> {
        let previous = store
            .get_fetch_job(name)
            .context(format!("Reading job {name}"))?;
        let run = Self {
            store,
            name,
            interval_seconds,
            started_at: Utc::now(),
            previous,
        };
        run.save(JobStatus::Running, (0, 0))?;
        return Ok(run);
    }

    /// Marks the run completed or failed and schedules the next one.
    pub fn finish(self, succeeded: bool) -> anyhow::Result<FetchJobSchedule> {
        let (status, outcome) = match succeeded {
            true => (JobStatus::Completed, (1, 0)),
            false => (JobStatus::Failed, (0, 1)),
        };
        let job = self.save(status, outcome)?;
        info!(
            "Job {} {} ({}/{} runs succeeded)",
            self.name,
            job.status(),
            job.successful_runs(),
            job.total_runs()
        );
        return Ok(job);
    }

    fn save(&self, status: JobStatus, (succeeded, failed): (i32, i32)) -> anyhow::Result<FetchJobSchedule> {
        let (total, successful, failed_runs) = match &self.previous {
            Some(job) => (*job.total_runs(), *job.successful_runs(), *job.failed_runs()),
            None => (0, 0, 0),
        };
        let finished = succeeded + failed;
        let next_run = match finished {
            0 => None,
            _ => self
                .started_at
                .checked_add_signed(TimeDelta::seconds(self.interval_seconds.into())),
        };
        let job = NewFetchJobScheduleBuilder::default()
            .job_name(self.name.to_owned())
            .interval_seconds(self.interval_seconds)
            .last_run(Some(self.started_at))
            .next_run(next_run)
            .status(status)
            .total_runs(total + finished)
            .successful_runs(successful + succeeded)
            .failed_runs(failed_runs + failed)
            .build()?;
        return self
            .store
            .upsert_fetch_job(&job)
            .context(format!("Saving job {}", self.name));
    }
}

#[cfg(test)]
mod tests {
    use store::{MemoryStore, Store};
    use types::JobStatus;

    use super::{JobRun, PRICES_INTERVAL_SECONDS, PRICES_JOB};

    #[test]
    fn run_is_marked_running_then_completed() {
        let store = MemoryStore::new();
        let run = JobRun::start(&store, PRICES_JOB, PRICES_INTERVAL_SECONDS).unwrap();
        let running = store.get_fetch_job(PRICES_JOB).unwrap().unwrap();
        assert_eq!(*running.status(), JobStatus::Running);
        assert_eq!(*running.total_runs(), 0);
        assert!(running.last_run().is_some());

        let job = run.finish(true).unwrap();
        assert_eq!(*job.status(), JobStatus::Completed);
        assert_eq!(*job.total_runs(), 1);
        assert_eq!(*job.successful_runs(), 1);
        let last_run = (*job.last_run()).unwrap();
        let next_run = (*job.next_run()).unwrap();
        assert_eq!((next_run - last_run).num_seconds(), 300);
    }

    #[test]
    fn counters_accumulate_across_runs() {
        let store = MemoryStore::new();
        JobRun::start(&store, PRICES_JOB, PRICES_INTERVAL_SECONDS)
            .unwrap()
            .finish(true)
            .unwrap();
        let job = JobRun::start(&store, PRICES_JOB, PRICES_INTERVAL_SECONDS)
            .unwrap()
            .finish(false)
            .unwrap();
        assert_eq!(*job.status(), JobStatus::Failed);
        assert_eq!(*job.total_runs(), 2);
        assert_eq!(*job.successful_runs(), 1);
        assert_eq!(*job.failed_runs(), 1);
        assert_eq!(store.list_fetch_jobs().unwrap().len(), 1);
    }
}
