use diesel::result::{DatabaseErrorKind, Error as DieselError};
use models::CandleKey;

use crate::retention::{CleanupReport, TableFailure};

/// Failures of the storage layer. Every variant names the operation and the
/// entity it was working on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{operation}: unknown trading pair {symbol}")]
    UnknownSymbol {
        operation: &'static str,
        symbol: String,
    },

    #[error("{operation}: candle {key} already exists")]
    UniquenessConflict {
        operation: &'static str,
        key: CandleKey,
    },

    #[error("{operation} {key}: storage unavailable")]
    Transient {
        operation: &'static str,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{operation} {key}: {reason}")]
    Invalid {
        operation: &'static str,
        key: String,
        reason: String,
    },

    #[error("{operation} {key}: database error")]
    Database {
        operation: &'static str,
        key: String,
        #[source]
        source: DieselError,
    },

    #[error("cleanup incomplete: {} table(s) failed after {} succeeded", .failed.len(), .report.entries().len())]
    PartialCleanup {
        report: CleanupReport,
        failed: Vec<TableFailure>,
    },
}

impl StoreError {
    pub(crate) fn invalid(operation: &'static str, key: &str, reason: impl ToString) -> Self {
        return Self::Invalid {
            operation,
            key: key.to_owned(),
            reason: reason.to_string(),
        };
    }

    pub(crate) fn from_diesel(operation: &'static str, key: &str, err: DieselError) -> Self {
        return match err {
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
            | DieselError::BrokenTransactionManager => Self::Transient {
                operation,
                key: key.to_owned(),
                source: Box::new(err),
            },
            err => Self::Database {
                operation,
                key: key.to_owned(),
                source: err,
            },
        };
    }

    /// Like `from_diesel`, but a foreign-key violation means `symbol` is not a
    /// known trading pair.
    pub(crate) fn from_diesel_for_symbol(
        operation: &'static str,
        symbol: &str,
        err: DieselError,
    ) -> Self {
        return match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                Self::UnknownSymbol {
                    operation,
                    symbol: symbol.to_owned(),
                }
            }
            err => Self::from_diesel(operation, symbol, err),
        };
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        return matches!(self, Self::Transient { .. });
    }
}
