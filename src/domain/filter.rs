use crate::domain::datetime::{minutes_of_day, time_minutes, to_local};
use crate::domain::models::{Task, parse_date, parse_hhmm};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// Date-range and time-of-day predicate over a task list.
///
/// Date bounds compare the task's local date-time against `start 00:00:00` and
/// `end 23:59:59`. The time window compares minutes of the day only, so it
/// applies to every day independently and never wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            start_time: DEFAULT_START_TIME,
            end_time: DEFAULT_END_TIME,
        }
    }
}

impl TaskFilter {
    /// Builds a filter from raw inputs; blank values fall back to the defaults.
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<Self, String> {
        Ok(Self {
            start_date: parse_optional(start_date, "start date", parse_date, "YYYY-MM-DD")?,
            end_date: parse_optional(end_date, "end date", parse_date, "YYYY-MM-DD")?,
            start_time: parse_optional(start_time, "start time", parse_hhmm, "HH:MM")?
                .unwrap_or(DEFAULT_START_TIME),
            end_time: parse_optional(end_time, "end time", parse_hhmm, "HH:MM")?
                .unwrap_or(DEFAULT_END_TIME),
        })
    }

    pub fn is_active(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.start_time != DEFAULT_START_TIME
            || self.end_time != DEFAULT_END_TIME
    }

    /// A window such as 22:00-02:00 can never match anything.
    pub fn has_reversed_time_window(&self) -> bool {
        self.start_time > self.end_time
    }

    pub fn matches(&self, task: &Task, tz: &Tz) -> bool {
        let local = to_local(task.due_date, tz).naive_local();

        if let Some(start_date) = self.start_date {
            if local < start_date.and_time(DEFAULT_START_TIME) {
                return false;
            }
        }
        if let Some(end_date) = self.end_date {
            if local > end_date.and_time(LAST_SECOND_OF_DAY) {
                return false;
            }
        }

        let minutes = minutes_of_day(task.due_date, tz);
        minutes >= time_minutes(self.start_time) && minutes <= time_minutes(self.end_time)
    }

    pub fn apply<'a, I>(&self, tasks: I, tz: &Tz) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks.into_iter().filter(|task| self.matches(task, tz)).collect()
    }
}

const DEFAULT_START_TIME: NaiveTime = hms(0, 0, 0);
const DEFAULT_END_TIME: NaiveTime = hms(23, 59, 0);
const LAST_SECOND_OF_DAY: NaiveTime = hms(23, 59, 59);

const fn hms(hour: u32, minute: u32, second: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, second) {
        Some(time) => time,
        None => panic!("fixed filter time out of range"),
    }
}

fn parse_optional<T>(
    raw: Option<&str>,
    field_name: &str,
    parse: fn(&str) -> Option<T>,
    expected: &str,
) -> Result<Option<T>, String> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| format!("{field_name} must be {expected}, got '{value}'")),
    }
}
