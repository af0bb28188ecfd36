//! Shift lifecycle state machine: check-in, lunch-start, lunch-end,
//! check-out. Every transition is guard-checked against the current store
//! state and performs at most one store write; a rejected transition
//! mutates nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::OrgTimeZone;
use crate::error::{ConflictReason, CoreError, CoreResult, ValidationReason};
use crate::model::{Employee, EmployeeId, Shift};
use crate::store::{EmployeeDirectory, TimeRecordStore};
use crate::work_hours;

pub struct TimeClock {
    records: Arc<dyn TimeRecordStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    tz: OrgTimeZone,
}

impl TimeClock {
    pub fn new(
        records: Arc<dyn TimeRecordStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        tz: OrgTimeZone,
    ) -> Self {
        Self {
            records,
            directory,
            clock,
            tz,
        }
    }

    /// Opens a shift for the employee with start = now. Rejects with a
    /// conflict when an open shift already exists on the current org-local
    /// day.
    pub async fn check_in(&self, employee_id: EmployeeId) -> CoreResult<Shift> {
        self.require_active_employee(employee_id).await?;
        let now = self.clock.now_utc();
        if self.open_shift_today(employee_id, now).await?.is_some() {
            warn!(
                "check-in rejected for employee {}: open shift already exists",
                employee_id
            );
            return Err(CoreError::Conflict(ConflictReason::AlreadyCheckedIn));
        }
        let shift = self.records.create_shift(employee_id, now).await?;
        info!(
            "employee {} checked in at {} (shift {})",
            employee_id, now, shift.id
        );
        Ok(shift)
    }

    pub async fn start_lunch(&self, employee_id: EmployeeId) -> CoreResult<Shift> {
        let now = self.clock.now_utc();
        let mut shift = self.require_open_shift(employee_id, now).await?;
        if shift.lunch_start.is_some() {
            warn!(
                "lunch-start rejected for employee {}: already started",
                employee_id
            );
            return Err(CoreError::Conflict(ConflictReason::LunchAlreadyStarted));
        }
        shift.lunch_start = Some(now);
        let shift = self.persist(shift).await?;
        info!("employee {} started lunch at {}", employee_id, now);
        Ok(shift)
    }

    pub async fn end_lunch(&self, employee_id: EmployeeId) -> CoreResult<Shift> {
        let now = self.clock.now_utc();
        let mut shift = self.require_open_shift(employee_id, now).await?;
        let lunch_start = match shift.lunch_start {
            Some(ls) => ls,
            None => {
                warn!(
                    "lunch-end rejected for employee {}: lunch not started",
                    employee_id
                );
                return Err(CoreError::Conflict(ConflictReason::LunchNotStarted));
            }
        };
        if shift.lunch_end.is_some() {
            warn!(
                "lunch-end rejected for employee {}: already ended",
                employee_id
            );
            return Err(CoreError::Conflict(ConflictReason::LunchAlreadyEnded));
        }
        if now <= lunch_start {
            return Err(CoreError::Validation(
                ValidationReason::LunchEndNotAfterStart {
                    lunch_start,
                    lunch_end: now,
                },
            ));
        }
        shift.lunch_end = Some(now);
        let shift = self.persist(shift).await?;
        info!("employee {} ended lunch at {}", employee_id, now);
        Ok(shift)
    }

    /// Closes the open shift and recomputes its worked-hours total before
    /// persisting. Ordering violations reject the whole transition; nothing
    /// is clamped.
    pub async fn check_out(&self, employee_id: EmployeeId) -> CoreResult<Shift> {
        let now = self.clock.now_utc();
        let mut shift = self.require_open_shift(employee_id, now).await?;
        if now <= shift.start {
            return Err(CoreError::Validation(ValidationReason::EndNotAfterStart {
                start: shift.start,
                end: now,
            }));
        }
        if let Some(lunch_end) = shift.lunch_end {
            if now <= lunch_end {
                return Err(CoreError::Validation(
                    ValidationReason::EndNotAfterLunchEnd {
                        lunch_end,
                        end: now,
                    },
                ));
            }
        }
        if work_hours::lunch_is_degenerate(shift.lunch_start, shift.lunch_end) {
            warn!(
                "shift {} for employee {} has a degenerate lunch pair ({:?}, {:?}); deducting zero",
                shift.id, employee_id, shift.lunch_start, shift.lunch_end
            );
        }
        shift.end = Some(now);
        let shift = self.persist(shift).await?;
        info!(
            "employee {} checked out at {} ({} worked hours)",
            employee_id,
            now,
            shift
                .total_worked_hours
                .map(|h| h.to_string())
                .unwrap_or_else(|| "?".into())
        );
        Ok(shift)
    }

    async fn require_active_employee(&self, employee_id: EmployeeId) -> CoreResult<Employee> {
        let employee = self
            .directory
            .get_employee(employee_id)
            .await?
            .ok_or(CoreError::EmployeeNotFound(employee_id))?;
        if !employee.active {
            return Err(CoreError::Conflict(ConflictReason::EmployeeInactive));
        }
        Ok(employee)
    }

    async fn open_shift_today(
        &self,
        employee_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Shift>> {
        let (day_start, day_end) = self.tz.day_bounds(self.tz.local_day(now));
        Ok(self
            .records
            .find_open_shift(employee_id, day_start, day_end)
            .await?)
    }

    async fn require_open_shift(
        &self,
        employee_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> CoreResult<Shift> {
        self.open_shift_today(employee_id, now)
            .await?
            .ok_or(CoreError::NoOpenShift(employee_id))
    }

    /// Single persist path for mutated shifts: recompute the total, then
    /// write. Keeps recomputation a named step rather than a save hook.
    async fn persist(&self, mut shift: Shift) -> CoreResult<Shift> {
        shift.recompute_total();
        Ok(self.records.update_shift(&shift).await?)
    }
}
