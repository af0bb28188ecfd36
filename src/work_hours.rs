//! Pure calculators: shift timestamps to worked hours, and weekly target
//! to per-workday goal. No I/O, no clock access.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const WORK_DAYS_PER_WEEK: u32 = 5;

/// All published hour quantities carry 2 fractional digits.
pub const HOURS_SCALE: u32 = 2;

const SECONDS_PER_HOUR: Decimal = dec!(3600);

pub fn round_hours(hours: Decimal) -> Decimal {
    hours.round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn hours_between(from: DateTime<Utc>, until: DateTime<Utc>) -> Decimal {
    Decimal::from((until - from).num_seconds()) / SECONDS_PER_HOUR
}

/// Worked hours for one shift: `max(0, (end - start) - lunch)`, rounded to
/// 2 decimals. `None` while the shift is open: an open shift has undefined
/// worked hours, never zero.
pub fn worked_hours(
    start: DateTime<Utc>,
    lunch_start: Option<DateTime<Utc>>,
    lunch_end: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<Decimal> {
    let end = end?;
    let worked = hours_between(start, end);
    let total = (worked - lunch_deduction(lunch_start, lunch_end)).max(Decimal::ZERO);
    Some(round_hours(total))
}

/// Lunch counts only when both stamps exist and lunch end is after lunch
/// start; a reversed or partial pair deducts nothing. Deliberate leniency:
/// callers detect the degenerate pair via [`lunch_is_degenerate`] and warn.
pub fn lunch_deduction(
    lunch_start: Option<DateTime<Utc>>,
    lunch_end: Option<DateTime<Utc>>,
) -> Decimal {
    match (lunch_start, lunch_end) {
        (Some(ls), Some(le)) if le > ls => hours_between(ls, le),
        _ => Decimal::ZERO,
    }
}

/// True when a recorded lunch pair contributes no deduction: reversed,
/// zero-length, or started but never ended.
pub fn lunch_is_degenerate(
    lunch_start: Option<DateTime<Utc>>,
    lunch_end: Option<DateTime<Utc>>,
) -> bool {
    match (lunch_start, lunch_end) {
        (Some(ls), Some(le)) => le <= ls,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Per-workday goal prorated from the weekly target. Zero when the target
/// is absent-equivalent (zero or negative); "no target" means the balance
/// is not computable, which accrual callers treat as a skip.
pub fn daily_goal(weekly_hours: Decimal) -> Decimal {
    daily_goal_with(weekly_hours, WORK_DAYS_PER_WEEK)
}

pub fn daily_goal_with(weekly_hours: Decimal, work_days_per_week: u32) -> Decimal {
    if weekly_hours <= Decimal::ZERO || work_days_per_week == 0 {
        return Decimal::ZERO;
    }
    round_hours(weekly_hours / Decimal::from(work_days_per_week))
}
