// Lifecycle state machine tests: guard rejections and the happy path,
// against the in-memory stores and a pinned test clock.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use crate::clock::{Clock, TestClock};
    use crate::config::OrgTimeZone;
    use crate::error::{ConflictReason, CoreError, ValidationReason};
    use crate::model::{EmployeeId, NewEmployee, Role};
    use crate::store::{
        EmployeeDirectory, InMemoryEmployeeDirectory, InMemoryTimeRecordStore, TimeRecordStore,
    };
    use crate::time_clock::TimeClock;

    struct Fixture {
        time_clock: TimeClock,
        records: Arc<InMemoryTimeRecordStore>,
        directory: Arc<InMemoryEmployeeDirectory>,
        clock: TestClock,
        employee_id: EmployeeId,
    }

    async fn fixture(start_time: &str) -> Fixture {
        let records = Arc::new(InMemoryTimeRecordStore::new());
        let directory = Arc::new(InMemoryEmployeeDirectory::new());
        let clock = TestClock::new(start_time);
        let employee = directory
            .create_employee(NewEmployee {
                full_name: "Alice Example".into(),
                email: "alice@example.com".into(),
                password_hash: "$argon2$test".into(),
                role: Role::Employee,
                weekly_hours: dec!(40),
                active: true,
            })
            .await
            .expect("employee creation");
        let time_clock = TimeClock::new(
            records.clone(),
            directory.clone(),
            Arc::new(clock.clone()),
            OrgTimeZone::utc(),
        );
        Fixture {
            time_clock,
            records,
            directory,
            clock,
            employee_id: employee.id,
        }
    }

    #[tokio::test]
    async fn check_in_opens_a_shift() {
        let f = fixture("2025-03-10 09:00:00").await;
        let shift = f.time_clock.check_in(f.employee_id).await.expect("check-in");
        assert!(shift.is_open());
        assert_eq!(shift.start, f.clock.now_utc());
        assert_eq!(shift.total_worked_hours, None);
    }

    #[tokio::test]
    async fn check_in_twice_is_a_conflict() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.advance(chrono::Duration::minutes(5));
        let err = f.time_clock.check_in(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(ConflictReason::AlreadyCheckedIn)
        ));
    }

    #[tokio::test]
    async fn check_in_unknown_employee_is_not_found() {
        let f = fixture("2025-03-10 09:00:00").await;
        let err = f.time_clock.check_in(9999).await.unwrap_err();
        assert!(matches!(err, CoreError::EmployeeNotFound(9999)));
    }

    #[tokio::test]
    async fn check_in_inactive_employee_is_a_conflict() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.directory
            .set_active(f.employee_id, false)
            .await
            .expect("deactivate");
        let err = f.time_clock.check_in(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(ConflictReason::EmployeeInactive)
        ));
    }

    #[tokio::test]
    async fn lunch_requires_an_open_shift() {
        let f = fixture("2025-03-10 12:00:00").await;
        let err = f.time_clock.start_lunch(f.employee_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoOpenShift(_)));
    }

    #[tokio::test]
    async fn duplicate_lunch_start_is_a_conflict() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        f.clock.advance(chrono::Duration::minutes(1));
        let err = f.time_clock.start_lunch(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(ConflictReason::LunchAlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn lunch_end_without_start_is_a_conflict() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        let err = f.time_clock.end_lunch(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(ConflictReason::LunchNotStarted)
        ));
    }

    #[tokio::test]
    async fn lunch_end_must_be_after_lunch_start() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        // Clock has not moved; lunch end == lunch start is rejected, no mutation.
        let err = f.time_clock.end_lunch(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationReason::LunchEndNotAfterStart { .. })
        ));
        let tz = OrgTimeZone::utc();
        let (day_start, day_end) = tz.day_bounds(tz.local_day(f.clock.now_utc()));
        let shift = f
            .records
            .find_open_shift(f.employee_id, day_start, day_end)
            .await
            .expect("lookup")
            .expect("open shift");
        assert_eq!(shift.lunch_end, None);
    }

    #[tokio::test]
    async fn duplicate_lunch_end_is_a_conflict() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        f.clock.set_time("2025-03-10 13:00:00");
        f.time_clock
            .end_lunch(f.employee_id)
            .await
            .expect("lunch end");
        f.clock.advance(chrono::Duration::minutes(1));
        let err = f.time_clock.end_lunch(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict(ConflictReason::LunchAlreadyEnded)
        ));
    }

    #[tokio::test]
    async fn check_out_must_be_after_check_in() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        // Clock has not moved.
        let err = f.time_clock.check_out(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationReason::EndNotAfterStart { .. })
        ));
    }

    #[tokio::test]
    async fn check_out_must_be_after_lunch_end() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        f.clock.set_time("2025-03-10 13:00:00");
        f.time_clock
            .end_lunch(f.employee_id)
            .await
            .expect("lunch end");
        // A backdated check-out attempt lands before the lunch end.
        f.clock.set_time("2025-03-10 12:30:00");
        let err = f.time_clock.check_out(f.employee_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationReason::EndNotAfterLunchEnd { .. })
        ));
    }

    #[tokio::test]
    async fn full_day_flow_computes_total() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        f.clock.set_time("2025-03-10 13:00:00");
        f.time_clock
            .end_lunch(f.employee_id)
            .await
            .expect("lunch end");
        f.clock.set_time("2025-03-10 18:00:00");
        let shift = f
            .time_clock
            .check_out(f.employee_id)
            .await
            .expect("check-out");
        assert!(!shift.is_open());
        assert_eq!(shift.total_worked_hours, Some(dec!(8.00)));

        // The day is closed; a repeat check-out has no open shift to act on.
        f.clock.advance(chrono::Duration::minutes(1));
        let err = f.time_clock.check_out(f.employee_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoOpenShift(_)));
    }

    #[tokio::test]
    async fn check_out_with_unfinished_lunch_deducts_nothing() {
        let f = fixture("2025-03-10 09:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-10 12:00:00");
        f.time_clock
            .start_lunch(f.employee_id)
            .await
            .expect("lunch start");
        f.clock.set_time("2025-03-10 17:00:00");
        let shift = f
            .time_clock
            .check_out(f.employee_id)
            .await
            .expect("check-out");
        assert_eq!(shift.total_worked_hours, Some(dec!(8.00)));
    }

    #[tokio::test]
    async fn yesterdays_open_shift_does_not_block_todays_check_in() {
        // "Open" is evaluated against the current local day; a forgotten
        // check-out from yesterday does not lock the employee out today.
        let f = fixture("2025-03-10 22:00:00").await;
        f.time_clock.check_in(f.employee_id).await.expect("check-in");
        f.clock.set_time("2025-03-11 09:00:00");
        let shift = f
            .time_clock
            .check_in(f.employee_id)
            .await
            .expect("next-day check-in");
        assert!(shift.is_open());
    }
}
