use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::ledger::BucketKind;

pub type Result<T> = std::result::Result<T, MemberError>;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("unknown rank: {0:?}")]
    UnknownRank(String),

    #[error("unknown status: {0:?}")]
    UnknownStatus(String),

    #[error("unknown fee bucket: {0:?}")]
    UnknownBucket(String),

    #[error("{kind} amount must be >= 0, got {amount}")]
    NegativeAmount { kind: BucketKind, amount: i64 },

    #[error("monthly fee must be > 0, got {0}")]
    NonPositiveFee(i64),

    #[error("fee amount {0} exceeds the supported maximum")]
    FeeTooLarge(i64),

    #[error("ledger amounts overflow")]
    AmountOverflow,

    #[error("member id must be > 0, got {0}")]
    InvalidId(u32),

    #[error("duplicate member id {0}")]
    DuplicateId(u32),

    #[error("no member ids left after {0}")]
    IdsExhausted(u32),

    #[error("member {0} not found")]
    MemberNotFound(u32),

    #[error("full name must not be empty")]
    EmptyName,

    #[error("date of leaving {leaving} is before date of joining {joining}")]
    LeavingBeforeJoining {
        joining: NaiveDate,
        leaving: NaiveDate,
    },

    #[error("{0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the file collaborator; shown to the operator as-is.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there are no members to export")]
    EmptyRoster,

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
