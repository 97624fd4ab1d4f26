pub mod interval;
pub mod status;

mod sql;

pub use interval::Interval;
pub use status::{JobStatus, PairStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid interval: {0}")]
    IntervalError(String),

    #[error("Invalid pair status: {0}")]
    PairStatusError(String),

    #[error("Invalid job status: {0}")]
    JobStatusError(String),
}
