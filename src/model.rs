use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::work_hours;

pub type EmployeeId = i64;
pub type ShiftId = i64;

/// Allowed range for the weekly-hours target of accrual-eligible employees.
pub const WEEKLY_HOURS_MIN: Decimal = dec!(10);
pub const WEEKLY_HOURS_MAX: Decimal = dec!(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Manager,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub email: String,
    /// Credential hash; opaque to the core, owned by the auth layer.
    pub password_hash: String,
    pub role: Role,
    /// Weekly-hours target, always within [WEEKLY_HOURS_MIN, WEEKLY_HOURS_MAX].
    pub weekly_hours: Decimal,
    /// Running hour balance ("hour bank"), signed, 2 fractional digits.
    /// Mutated exclusively by the balance accrual engine.
    pub balance: Decimal,
    pub active: bool,
}

/// Payload for directory-side employee creation. Balance always starts at
/// zero; the id is assigned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub weekly_hours: Decimal,
    pub active: bool,
}

pub fn weekly_hours_in_range(target: Decimal) -> bool {
    (WEEKLY_HOURS_MIN..=WEEKLY_HOURS_MAX).contains(&target)
}

/// One employee's work period for a day, from check-in to check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub employee_id: EmployeeId,
    pub start: DateTime<Utc>,
    pub lunch_start: Option<DateTime<Utc>>,
    pub lunch_end: Option<DateTime<Utc>>,
    /// None while the shift is still open.
    pub end: Option<DateTime<Utc>>,
    /// None until the shift is closed; recomputed on every persisted
    /// mutation of the timestamps.
    pub total_worked_hours: Option<Decimal>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Explicit recomputation step invoked before every persist, in place
    /// of a save-side lifecycle hook.
    pub fn recompute_total(&mut self) {
        self.total_worked_hours =
            work_hours::worked_hours(self.start, self.lunch_start, self.lunch_end, self.end);
    }
}
