//! Balance accrual engine: folds closed shifts into the employee's running
//! hour balance.
//!
//! Two recomputation modes with different consistency guarantees:
//! incremental accrual ([`BalanceEngine::accrue_day`]) adds one day's delta
//! through an atomic store increment and is NOT idempotent; invoking it
//! twice for the same day double-counts. Full recomputation
//! ([`BalanceEngine::recompute_as_of`]) rebuilds the balance from the whole
//! history and overwrites it, and is the sanctioned path after shift edits
//! or suspected duplicate accrual.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::OrgTimeZone;
use crate::error::{CoreError, CoreResult};
use crate::model::{Employee, EmployeeId};
use crate::store::{EmployeeDirectory, TimeRecordStore};
use crate::work_hours::{daily_goal, round_hours};

pub struct BalanceEngine {
    records: Arc<dyn TimeRecordStore>,
    directory: Arc<dyn EmployeeDirectory>,
    tz: OrgTimeZone,
}

/// Result of one incremental accrual invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// Delta added to the stored balance (zero when the day had nothing to
    /// contribute, in which case no write happened).
    Applied { delta: Decimal },
    /// Employee is inactive; balance frozen, nothing written.
    SkippedInactive,
}

/// One day of balance history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDay {
    pub date: NaiveDate,
    pub worked_hours: Decimal,
    pub daily_goal: Decimal,
    pub daily_balance: Decimal,
}

impl BalanceEngine {
    pub fn new(
        records: Arc<dyn TimeRecordStore>,
        directory: Arc<dyn EmployeeDirectory>,
        tz: OrgTimeZone,
    ) -> Self {
        Self {
            records,
            directory,
            tz,
        }
    }

    /// Incremental accrual for one employee and one org-local day: sums the
    /// daily balances of closed shifts starting in that day and adds the
    /// sum to the stored balance via the directory's atomic increment.
    ///
    /// Assumes the day has not been accrued before; repeating the call
    /// re-adds the same delta.
    pub async fn accrue_day(
        &self,
        employee_id: EmployeeId,
        day: NaiveDate,
    ) -> CoreResult<AccrualOutcome> {
        let employee = self.require_employee(employee_id).await?;
        if !employee.active {
            info!(
                "accrual skipped for inactive employee {} (balance frozen)",
                employee_id
            );
            return Ok(AccrualOutcome::SkippedInactive);
        }
        let goal = daily_goal(employee.weekly_hours);
        if goal <= Decimal::ZERO {
            warn!(
                "employee {} has no usable daily target (weekly hours {}); balance not computable",
                employee_id, employee.weekly_hours
            );
            return Ok(AccrualOutcome::Applied {
                delta: Decimal::ZERO,
            });
        }

        let (day_start, day_end) = self.tz.day_bounds(day);
        let shifts = self
            .records
            .find_closed_shifts_in(employee_id, Some(day_start), day_end)
            .await?;
        if shifts.is_empty() {
            debug!(
                "no closed shifts for employee {} on {}; balance unchanged",
                employee_id, day
            );
            return Ok(AccrualOutcome::Applied {
                delta: Decimal::ZERO,
            });
        }

        let mut delta = Decimal::ZERO;
        for shift in &shifts {
            match shift.total_worked_hours {
                Some(worked) => delta += worked - goal,
                None => warn!(
                    "closed shift {} for employee {} has no computed total; skipping it",
                    shift.id, employee_id
                ),
            }
        }
        let delta = round_hours(delta);

        let updated = self
            .directory
            .increment_balance(employee_id, delta)
            .await?
            .ok_or(CoreError::EmployeeNotFound(employee_id))?;
        info!(
            "accrued {} for employee {} on {} ({} shifts); balance now {}",
            delta,
            employee_id,
            day,
            shifts.len(),
            updated.balance
        );
        Ok(AccrualOutcome::Applied { delta })
    }

    /// Full recomputation: rebuilds the employee's entire balance from
    /// every closed shift up to the end of `as_of_day` and overwrites the
    /// stored value. Idempotent; returns the new balance.
    ///
    /// The daily goal is derived inside the directory's write critical
    /// section, so a target change landing mid-recompute cannot leave the
    /// overwrite computed against the old target.
    pub async fn recompute_as_of(
        &self,
        employee_id: EmployeeId,
        as_of_day: NaiveDate,
    ) -> CoreResult<Decimal> {
        let employee = self.require_employee(employee_id).await?;
        if !employee.active {
            info!(
                "recompute skipped for inactive employee {} (balance frozen at {})",
                employee_id, employee.balance
            );
            return Ok(employee.balance);
        }
        if daily_goal(employee.weekly_hours) <= Decimal::ZERO {
            warn!(
                "employee {} has no usable daily target (weekly hours {}); balance left at {}",
                employee_id, employee.weekly_hours, employee.balance
            );
            return Ok(employee.balance);
        }

        let (_, until) = self.tz.day_bounds(as_of_day);
        let shifts = self
            .records
            .find_closed_shifts_in(employee_id, None, until)
            .await?;
        let totals: Vec<Decimal> = shifts
            .iter()
            .filter_map(|shift| shift.total_worked_hours)
            .collect();
        let shift_count = shifts.len();

        let updated = self
            .directory
            .update_balance_with(
                employee_id,
                Box::new(move |current| {
                    let goal = daily_goal(current.weekly_hours);
                    let mut balance = Decimal::ZERO;
                    for worked in &totals {
                        balance += worked - goal;
                    }
                    round_hours(balance)
                }),
            )
            .await?
            .ok_or(CoreError::EmployeeNotFound(employee_id))?;
        info!(
            "recomputed balance for employee {} as of {}: {} ({} shifts in history)",
            employee_id,
            as_of_day,
            updated.balance,
            shift_count
        );
        Ok(updated.balance)
    }

    /// Per-day balance history over an inclusive org-local day range:
    /// oldest to newest, one item per day with at least one closed shift.
    /// The returned sequence is finite, computed lazily per item, and
    /// restartable.
    pub async fn balance_history(
        &self,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<BalanceHistory> {
        let employee = self.require_employee(employee_id).await?;
        let goal = daily_goal(employee.weekly_hours);

        let (range_start, _) = self.tz.day_bounds(from);
        let (_, range_end) = self.tz.day_bounds(to);
        let shifts = self
            .records
            .find_closed_shifts_in(employee_id, Some(range_start), range_end)
            .await?;

        let mut worked_by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for shift in &shifts {
            if let Some(worked) = shift.total_worked_hours {
                *worked_by_day
                    .entry(self.tz.local_day(shift.start))
                    .or_insert(Decimal::ZERO) += worked;
            }
        }

        Ok(BalanceHistory {
            days: worked_by_day.into_iter().collect(),
            goal,
            pos: 0,
        })
    }

    async fn require_employee(&self, employee_id: EmployeeId) -> CoreResult<Employee> {
        self.directory
            .get_employee(employee_id)
            .await?
            .ok_or(CoreError::EmployeeNotFound(employee_id))
    }
}

/// Lazy oldest-to-newest walk over per-day balances. Cloning yields an
/// independent cursor; [`BalanceHistory::restarted`] rewinds to the start.
#[derive(Debug, Clone)]
pub struct BalanceHistory {
    days: Vec<(NaiveDate, Decimal)>,
    goal: Decimal,
    pos: usize,
}

impl BalanceHistory {
    pub fn restarted(&self) -> Self {
        Self {
            days: self.days.clone(),
            goal: self.goal,
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Iterator for BalanceHistory {
    type Item = BalanceDay;

    fn next(&mut self) -> Option<Self::Item> {
        let (date, worked) = *self.days.get(self.pos)?;
        self.pos += 1;
        let worked_hours = round_hours(worked);
        Some(BalanceDay {
            date,
            worked_hours,
            daily_goal: self.goal,
            daily_balance: round_hours(worked_hours - self.goal),
        })
    }
}
