use std::str::FromStr;

use diesel::{deserialize::FromSqlRow, expression::AsExpression, sql_types::Text};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Active,
    Inactive,
}

impl PairStatus {
    pub fn as_str(&self) -> &'static str {
        return match self {
            PairStatus::Active => "active",
            PairStatus::Inactive => "inactive",
        };
    }

    /// Maps the exchange's symbol status (`TRADING`, `BREAK`, `HALT`...) to ours.
    pub fn from_exchange(status: &str) -> Self {
        return match status {
            "TRADING" => PairStatus::Active,
            _ => PairStatus::Inactive,
        };
    }
}

impl std::fmt::Display for PairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}

impl FromStr for PairStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "active" => Ok(PairStatus::Active),
            "inactive" => Ok(PairStatus::Inactive),
            _ => Err(Error::PairStatusError(s.to_owned())),
        };
    }
}

crate::sql::text_sql!(PairStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        return match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(Error::JobStatusError(s.to_owned())),
        };
    }
}

crate::sql::text_sql!(JobStatus);
