use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{EmployeeId, ShiftId};

/// Malformed or out-of-range input. Rejected before any mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    #[error("lunch end {lunch_end} must be strictly after lunch start {lunch_start}")]
    LunchEndNotAfterStart {
        lunch_start: DateTime<Utc>,
        lunch_end: DateTime<Utc>,
    },
    #[error("check-out {end} must be strictly after check-in {start}")]
    EndNotAfterStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("check-out {end} must be strictly after lunch end {lunch_end}")]
    EndNotAfterLunchEnd {
        lunch_end: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("weekly hours target {target} is outside the allowed range [10, 60]")]
    WeeklyHoursOutOfRange { target: Decimal },
}

/// Guard violation due to existing state. Rejected before any mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    #[error("an open shift already exists for today")]
    AlreadyCheckedIn,
    #[error("lunch already started")]
    LunchAlreadyStarted,
    #[error("lunch already ended")]
    LunchAlreadyEnded,
    #[error("lunch has not been started")]
    LunchNotStarted,
    #[error("employee is inactive")]
    EmployeeInactive,
    #[error("email {email} is already registered")]
    EmailAlreadyRegistered { email: String },
}

/// Error taxonomy for all core operations. Validation / Conflict / NotFound
/// variants carry enough detail for a UI to explain the rejection; backing
/// store faults surface generically through `Internal`.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(ValidationReason),
    #[error("conflict: {0}")]
    Conflict(ConflictReason),
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("no open shift for employee {0} today")]
    NoOpenShift(EmployeeId),
    #[error("storage fault: {0}")]
    Internal(#[source] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by store implementations. Constraint violations keep
/// their own variants so the core can map them back onto the taxonomy.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("weekly hours target {0} is outside the allowed range [10, 60]")]
    WeeklyHoursOutOfRange(Decimal),
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("shift {0} does not exist")]
    ShiftMissing(ShiftId),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WeeklyHoursOutOfRange(target) => {
                CoreError::Validation(ValidationReason::WeeklyHoursOutOfRange { target })
            }
            StoreError::EmailTaken(email) => {
                CoreError::Conflict(ConflictReason::EmailAlreadyRegistered { email })
            }
            err @ StoreError::ShiftMissing(_) => CoreError::Internal(anyhow::Error::new(err)),
            StoreError::Backend(e) => CoreError::Internal(e),
        }
    }
}
