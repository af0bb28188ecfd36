use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

/// Application configuration, deserialized from `TIMEBANK_`-prefixed
/// environment variables. `.env` files are honored via dotenv in the binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Offset of the organization's local time from UTC, in minutes.
    /// All calendar-day boundaries (lifecycle "today", accrual day windows,
    /// the scheduler's "previous day") are computed in this zone.
    #[serde(default)]
    pub org_utc_offset_minutes: i32,
    /// Master switch for the scheduled accrual driver. On-demand accrual
    /// stays available when this is off.
    #[serde(default = "default_accrual_enabled")]
    pub accrual_enabled: bool,
    /// Org-local hour at which the nightly accrual run fires.
    #[serde(default = "default_accrual_run_hour")]
    pub accrual_run_hour: u32,
    /// Org-local minute at which the nightly accrual run fires.
    #[serde(default)]
    pub accrual_run_minute: u32,
}

fn default_accrual_enabled() -> bool {
    true
}

fn default_accrual_run_hour() -> u32 {
    2
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            org_utc_offset_minutes: 0,
            accrual_enabled: default_accrual_enabled(),
            accrual_run_hour: default_accrual_run_hour(),
            accrual_run_minute: 0,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("TIMEBANK_").from_env()
    }

    pub fn org_time_zone(&self) -> OrgTimeZone {
        OrgTimeZone::from_offset_minutes(self.org_utc_offset_minutes)
    }
}

/// The single day-boundary policy shared by the shift lifecycle and the
/// accrual engine. Both must agree on what "today" means for incremental
/// accrual to line up with shift creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgTimeZone {
    offset: FixedOffset,
}

impl OrgTimeZone {
    pub fn utc() -> Self {
        Self {
            offset: FixedOffset::east_opt(0).expect("zero offset is always valid"),
        }
    }

    pub fn from_offset_minutes(minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => Self { offset },
            None => {
                warn!(
                    "org UTC offset {} minutes is out of range; falling back to UTC",
                    minutes
                );
                Self::utc()
            }
        }
    }

    /// Calendar day the instant falls on, in org-local time.
    pub fn local_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Org-local wall-clock view of the instant.
    pub fn local_datetime(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        ts.with_timezone(&self.offset).naive_local()
    }

    /// UTC instant at which the given org-local day begins.
    pub fn day_start(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_naive = local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64);
        Utc.from_utc_datetime(&utc_naive)
    }

    /// Half-open `[start, end)` UTC window covering the org-local day.
    pub fn day_bounds(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.day_start(day);
        (start, start + Duration::days(1))
    }

    /// Org-local day immediately before the one the instant falls on.
    pub fn previous_day(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_day(now) - Duration::days(1)
    }
}
