// Day-boundary policy tests for the configured org offset.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

    use crate::config::OrgTimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| panic!("invalid datetime string: {}", s));
        Utc.from_utc_datetime(&naive)
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("invalid date string: {}", s))
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        // FixedOffset only accepts offsets strictly inside one day.
        assert_eq!(OrgTimeZone::from_offset_minutes(24 * 60), OrgTimeZone::utc());
        assert_eq!(
            OrgTimeZone::from_offset_minutes(-24 * 60),
            OrgTimeZone::utc()
        );
        // Values whose second count does not fit an i32 at all.
        assert_eq!(OrgTimeZone::from_offset_minutes(i32::MAX), OrgTimeZone::utc());
        assert_eq!(OrgTimeZone::from_offset_minutes(i32::MIN), OrgTimeZone::utc());
    }

    #[test]
    fn day_bounds_shift_with_the_offset() {
        // UTC+2: the org-local day starts two hours before UTC midnight.
        let tz = OrgTimeZone::from_offset_minutes(120);
        let (start, end) = tz.day_bounds(d("2025-03-11"));
        assert_eq!(start, ts("2025-03-10 22:00:00"));
        assert_eq!(end, ts("2025-03-11 22:00:00"));
        assert_eq!(tz.local_day(ts("2025-03-10 23:30:00")), d("2025-03-11"));
    }

    #[test]
    fn previous_day_is_relative_to_the_org_local_day() {
        let tz = OrgTimeZone::from_offset_minutes(-300);
        // 03:00 UTC is still the previous evening at UTC-5.
        assert_eq!(tz.previous_day(ts("2025-03-11 03:00:00")), d("2025-03-09"));
        assert_eq!(tz.previous_day(ts("2025-03-11 12:00:00")), d("2025-03-10"));
    }
}
