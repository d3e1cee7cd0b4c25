//! Conversions between stored instants and what a person reads on screen.
//!
//! Everything that depends on a calendar day or a wall-clock time takes the
//! configured timezone explicitly; instants stay in UTC everywhere else.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

const DUE_DATE_FORMAT: &str = "%b %-d, %Y";
const DUE_TIME_FORMAT: &str = "%I:%M %p";
const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y";
const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
const FORM_TIME_FORMAT: &str = "%H:%M";

pub fn to_local(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    instant.with_timezone(tz)
}

pub fn local_day(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    to_local(instant, tz).date_naive()
}

/// Hours times sixty plus minutes of the local wall-clock time; seconds are dropped.
pub fn minutes_of_day(instant: DateTime<Utc>, tz: &Tz) -> u32 {
    let local = to_local(instant, tz);
    local.hour() * 60 + local.minute()
}

pub fn time_minutes(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Resolves a local date and time to an instant. Ambiguous times (DST fall-back)
/// take the earlier instant; times inside a DST gap do not exist and yield `None`.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

pub fn format_due_date(instant: DateTime<Utc>, tz: &Tz) -> String {
    to_local(instant, tz).format(DUE_DATE_FORMAT).to_string()
}

pub fn format_due_time(instant: DateTime<Utc>, tz: &Tz) -> String {
    to_local(instant, tz).format(DUE_TIME_FORMAT).to_string()
}

pub fn format_long_date(instant: DateTime<Utc>, tz: &Tz) -> String {
    to_local(instant, tz).format(LONG_DATE_FORMAT).to_string()
}

/// Splits an instant into the `YYYY-MM-DD` and `HH:MM` strings a form edits.
pub fn split_for_form(instant: DateTime<Utc>, tz: &Tz) -> (String, String) {
    let local = to_local(instant, tz);
    (
        local.format(FORM_DATE_FORMAT).to_string(),
        local.format(FORM_TIME_FORMAT).to_string(),
    )
}

pub fn is_overdue(due: DateTime<Utc>, completed: bool, now: DateTime<Utc>) -> bool {
    due < now && !completed
}

/// Label shown under a task: "in 3 hours", "2 days overdue", "Completed".
pub fn relative_label(due: DateTime<Utc>, completed: bool, now: DateTime<Utc>) -> String {
    if completed {
        return "Completed".to_string();
    }

    if is_overdue(due, completed, now) {
        let elapsed = now - due;
        let days = elapsed.num_days();
        if days > 0 {
            return format!("{days} {} overdue", plural(days, "day"));
        }
        let hours = elapsed.num_hours();
        if hours > 0 {
            return format!("{hours} {} overdue", plural(hours, "hour"));
        }
        return "Overdue".to_string();
    }

    let remaining = due - now;
    let days = remaining.num_days();
    if days > 0 {
        return format!("in {days} {}", plural(days, "day"));
    }
    let hours = remaining.num_hours();
    if hours > 0 {
        return format!("in {hours} {}", plural(hours, "hour"));
    }
    let minutes = remaining.num_minutes();
    format!("in {minutes} {}", plural(minutes, "minute"))
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use chrono_tz::{America, UTC};

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    #[test]
    fn one_full_day_past_due_reads_one_day_overdue() {
        let due = fixed_time("2024-01-01T09:00:00Z");
        let now = fixed_time("2024-01-02T09:00:00Z");
        assert_eq!(relative_label(due, false, now), "1 day overdue");
        assert_eq!(relative_label(due, false, now + Duration::days(2)), "3 days overdue");
    }

    #[test]
    fn overdue_label_falls_back_to_hours_then_plain() {
        let due = fixed_time("2024-01-01T09:00:00Z");
        assert_eq!(
            relative_label(due, false, due + Duration::minutes(150)),
            "2 hours overdue"
        );
        assert_eq!(
            relative_label(due, false, due + Duration::minutes(61)),
            "1 hour overdue"
        );
        assert_eq!(relative_label(due, false, due + Duration::minutes(10)), "Overdue");
    }

    #[test]
    fn upcoming_label_counts_days_hours_minutes() {
        let now = fixed_time("2024-01-01T12:00:00Z");
        assert_eq!(relative_label(now + Duration::hours(49), false, now), "in 2 days");
        assert_eq!(relative_label(now + Duration::hours(3), false, now), "in 3 hours");
        assert_eq!(relative_label(now + Duration::minutes(1), false, now), "in 1 minute");
        assert_eq!(relative_label(now + Duration::seconds(30), false, now), "in 0 minutes");
    }

    #[test]
    fn completed_tasks_never_read_overdue() {
        let due = fixed_time("2024-01-01T09:00:00Z");
        let now = fixed_time("2024-01-05T09:00:00Z");
        assert_eq!(relative_label(due, true, now), "Completed");
        assert!(!is_overdue(due, true, now));
        assert!(is_overdue(due, false, now));
    }

    #[test]
    fn display_formats_follow_local_timezone() {
        let due = fixed_time("2024-03-05T14:30:00Z");
        assert_eq!(format_due_date(due, &UTC), "Mar 5, 2024");
        assert_eq!(format_due_time(due, &UTC), "02:30 PM");
        assert_eq!(format_due_time(due, &America::New_York), "09:30 AM");
        assert_eq!(format_long_date(due, &UTC), "Tuesday, March 5, 2024");
    }

    #[test]
    fn local_day_and_minutes_shift_with_timezone() {
        let instant = fixed_time("2024-01-02T03:15:00Z");
        assert_eq!(local_day(instant, &UTC), NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"));
        assert_eq!(
            local_day(instant, &America::New_York),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")
        );
        assert_eq!(minutes_of_day(instant, &UTC), 3 * 60 + 15);
        assert_eq!(minutes_of_day(instant, &America::New_York), 22 * 60 + 15);
    }

    #[test]
    fn local_instant_skips_nonexistent_dst_times() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("date");
        let gap = NaiveTime::from_hms_opt(2, 30, 0).expect("time");
        assert!(local_instant(date, gap, &America::New_York).is_none());

        let noon = NaiveTime::from_hms_opt(12, 0, 0).expect("time");
        assert_eq!(
            local_instant(date, noon, &America::New_York),
            Some(fixed_time("2024-03-10T16:00:00Z"))
        );
    }

    #[test]
    fn split_for_form_uses_local_wall_clock() {
        let instant = fixed_time("2024-03-05T14:30:00Z");
        assert_eq!(
            split_for_form(instant, &UTC),
            ("2024-03-05".to_string(), "14:30".to_string())
        );
        assert_eq!(
            split_for_form(instant, &America::Los_Angeles),
            ("2024-03-05".to_string(), "06:30".to_string())
        );
    }
}
