//! Scheduled accrual driver: once per day, at a configured org-local time,
//! run incremental accrual for every active employee for the previous
//! calendar day. Background loop in the same shape as a token-refresh task:
//! sleep, act, log, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::accrual::{AccrualOutcome, BalanceEngine};
use crate::clock::Clock;
use crate::config::{AppConfig, OrgTimeZone};
use crate::error::CoreResult;
use crate::store::EmployeeDirectory;

pub struct AccrualScheduler {
    engine: Arc<BalanceEngine>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    tz: OrgTimeZone,
    enabled: bool,
    run_hour: u32,
    run_minute: u32,
    running: AtomicBool,
}

/// Tally of one completed accrual run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub day: NaiveDate,
    pub accrued: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// A previous run still holds the overlap guard; this trigger is
    /// dropped, not queued.
    SkippedOverlap,
    /// The driver is disabled by configuration.
    Disabled,
}

impl AccrualScheduler {
    pub fn new(
        engine: Arc<BalanceEngine>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        tz: OrgTimeZone,
        config: &AppConfig,
    ) -> Self {
        Self {
            engine,
            directory,
            clock,
            tz,
            enabled: config.accrual_enabled,
            run_hour: config.accrual_run_hour,
            run_minute: config.accrual_run_minute,
            running: AtomicBool::new(false),
        }
    }

    /// One accrual cycle for the previous org-local day. Per-employee
    /// failures are logged and the run continues; a fault outside the
    /// per-employee loop aborts the cycle and propagates. The overlap
    /// guard is released on every exit path.
    pub async fn run_daily_accrual(&self) -> CoreResult<RunOutcome> {
        if !self.enabled {
            info!("accrual driver is disabled by configuration; skipping run");
            return Ok(RunOutcome::Disabled);
        }
        let _guard = match RunGuard::try_acquire(&self.running) {
            Some(guard) => guard,
            None => {
                warn!("previous accrual run still in progress; skipping this trigger");
                return Ok(RunOutcome::SkippedOverlap);
            }
        };

        let day = self.tz.previous_day(self.clock.now_utc());
        info!("starting daily accrual run for {}", day);

        let employees = self.directory.list_active_employees().await?;
        let mut summary = RunSummary {
            day,
            accrued: 0,
            skipped: 0,
            failed: 0,
        };
        for employee in employees {
            match self.engine.accrue_day(employee.id, day).await {
                Ok(AccrualOutcome::Applied { delta }) => {
                    debug!("employee {}: accrued {}", employee.id, delta);
                    summary.accrued += 1;
                }
                Ok(AccrualOutcome::SkippedInactive) => summary.skipped += 1,
                Err(e) => {
                    error!("accrual failed for employee {}: {:#}", employee.id, e);
                    summary.failed += 1;
                }
            }
        }
        info!(
            "daily accrual run for {} finished: {} accrued, {} skipped, {} failed",
            summary.day, summary.accrued, summary.skipped, summary.failed
        );
        Ok(RunOutcome::Completed(summary))
    }

    /// Seconds until the next configured org-local run time, at least 1.
    pub fn seconds_until_next_run(&self) -> u64 {
        let now_local = self.tz.local_datetime(self.clock.now_utc());
        let run_time = NaiveTime::from_hms_opt(self.run_hour.min(23), self.run_minute.min(59), 0)
            .unwrap_or(NaiveTime::MIN);
        let mut target = now_local.date().and_time(run_time);
        if target <= now_local {
            target += Duration::days(1);
        }
        (target - now_local).num_seconds().max(1) as u64
    }
}

/// Overlap guard held for the duration of a run; Drop releases the flag
/// unconditionally, faulted exits included.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(RunGuard { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Long-running driver task: sleep until the configured run time, fire,
/// repeat. An aborted cycle is logged and the loop keeps going.
pub async fn run_accrual_scheduler(scheduler: Arc<AccrualScheduler>) {
    info!("starting background accrual scheduler task");
    loop {
        let wait_secs = scheduler.seconds_until_next_run();
        debug!("next accrual run in {} seconds", wait_secs);
        sleep(std::time::Duration::from_secs(wait_secs)).await;
        if let Err(e) = scheduler.run_daily_accrual().await {
            error!("daily accrual run aborted: {:#}", e);
        }
    }
}
