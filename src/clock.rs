use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

/// Source of "now" for the lifecycle state machine and the scheduler,
/// injectable so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests; shared handles observe the same time.
#[derive(Clone)]
pub struct TestClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new(datetime_str: &str) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(parse_utc(datetime_str))),
        }
    }

    pub fn set_time(&self, datetime_str: &str) {
        *self.current_time.lock().unwrap() = parse_utc(datetime_str);
    }

    pub fn advance(&self, duration: Duration) {
        *self.current_time.lock().unwrap() += duration;
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.current_time.lock().unwrap()
    }
}

fn parse_utc(datetime_str: &str) -> DateTime<Utc> {
    let naive = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| panic!("invalid datetime string: {}", datetime_str));
    Utc.from_utc_datetime(&naive)
}
