//! timebank: employee time-tracking core.
//!
//! Employees check in/out and record lunch breaks through the shift
//! lifecycle state machine; the balance accrual engine compares worked
//! hours against a prorated daily target and maintains a running
//! hour-balance per employee, driven nightly by the accrual scheduler.

pub mod accrual;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod time_clock;
pub mod work_hours;

mod config_tests;
mod time_clock_tests;
