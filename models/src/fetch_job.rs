use chrono::{DateTime, Utc};
use derive_builder::Builder;
use derive_getters::Getters;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use types::JobStatus;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::fetch_job_schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FetchJobSchedule {
    id: i32,
    job_name: String,
    interval_seconds: i32,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
    is_active: bool,
    status: JobStatus,
    total_runs: i32,
    successful_runs: i32,
    failed_runs: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FetchJobSchedule {
    /// Overwrites the mutable fields with `job`'s. `None` run times keep the
    /// stored value.
    pub fn apply(&mut self, job: &NewFetchJobSchedule, now: DateTime<Utc>) {
        self.interval_seconds = job.interval_seconds;
        if job.last_run.is_some() {
            self.last_run = job.last_run;
        }
        if job.next_run.is_some() {
            self.next_run = job.next_run;
        }
        self.is_active = job.is_active;
        self.status = job.status;
        self.total_runs = job.total_runs;
        self.successful_runs = job.successful_runs;
        self.failed_runs = job.failed_runs;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset, Builder, Getters, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::fetch_job_schedules)]
pub struct NewFetchJobSchedule {
    job_name: String,
    interval_seconds: i32,
    #[builder(default)]
    last_run: Option<DateTime<Utc>>,
    #[builder(default)]
    next_run: Option<DateTime<Utc>>,
    #[builder(default = "true")]
    is_active: bool,
    #[builder(default = "JobStatus::Pending")]
    status: JobStatus,
    #[builder(default)]
    total_runs: i32,
    #[builder(default)]
    successful_runs: i32,
    #[builder(default)]
    failed_runs: i32,
}

impl NewFetchJobSchedule {
    pub fn into_fetch_job_schedule(self, id: i32, now: DateTime<Utc>) -> FetchJobSchedule {
        return FetchJobSchedule {
            id,
            job_name: self.job_name,
            interval_seconds: self.interval_seconds,
            last_run: self.last_run,
            next_run: self.next_run,
            is_active: self.is_active,
            status: self.status,
            total_runs: self.total_runs,
            successful_runs: self.successful_runs,
            failed_runs: self.failed_runs,
            created_at: now,
            updated_at: now,
        };
    }
}
