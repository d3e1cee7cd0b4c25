use crate::domain::datetime::minutes_of_day;
use crate::domain::models::Task;
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    #[default]
    Default,
    DateAsc,
    DateDesc,
    TimeAsc,
    TimeDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        Self::Default,
        Self::DateAsc,
        Self::DateDesc,
        Self::TimeAsc,
        Self::TimeDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
            Self::TimeAsc => "time-asc",
            Self::TimeDesc => "time-desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| {
                let expected = Self::ALL.map(SortOption::as_str).join(", ");
                format!("unknown sort option '{normalized}' (expected one of: {expected})")
            })
    }
}

/// Returns a newly ordered list. `sort_by` is stable, so tasks that compare
/// equal (same instant, or same time of day under the time keys) keep input order.
pub fn sort_tasks<'a>(tasks: &[&'a Task], option: SortOption, tz: &Tz) -> Vec<&'a Task> {
    let mut sorted = tasks.to_vec();
    match option {
        SortOption::Default | SortOption::DateAsc => {
            sorted.sort_by(|left, right| left.due_date.cmp(&right.due_date));
        }
        SortOption::DateDesc => {
            sorted.sort_by(|left, right| right.due_date.cmp(&left.due_date));
        }
        SortOption::TimeAsc => {
            sorted.sort_by_key(|task| minutes_of_day(task.due_date, tz));
        }
        SortOption::TimeDesc => {
            sorted.sort_by(|left, right| {
                minutes_of_day(right.due_date, tz).cmp(&minutes_of_day(left.due_date, tz))
            });
        }
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use chrono_tz::UTC;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn task(id: &str, due: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            due_date: fixed_time(due),
            completed: false,
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn parses_every_option_name() {
        for option in SortOption::ALL {
            assert_eq!(option.as_str().parse::<SortOption>(), Ok(option));
        }
        assert!("newest".parse::<SortOption>().is_err());
    }

    #[test]
    fn time_asc_orders_by_time_of_day() {
        let tasks = vec![
            task("afternoon", "2024-01-01T15:00:00Z"),
            task("morning", "2024-01-01T09:00:00Z"),
        ];
        let refs: Vec<&Task> = tasks.iter().collect();
        let sorted = sort_tasks(&refs, SortOption::TimeAsc, &UTC);
        assert_eq!(ids(&sorted), vec!["morning", "afternoon"]);
    }

    #[test]
    fn time_keys_ignore_date_and_keep_ties_in_input_order() {
        let tasks = vec![
            task("late-day", "2024-01-05T10:00:00Z"),
            task("evening", "2024-01-01T20:00:00Z"),
            task("early-day", "2024-01-02T10:00:00Z"),
        ];
        let refs: Vec<&Task> = tasks.iter().collect();
        assert_eq!(
            ids(&sort_tasks(&refs, SortOption::TimeAsc, &UTC)),
            vec!["late-day", "early-day", "evening"]
        );
        assert_eq!(
            ids(&sort_tasks(&refs, SortOption::TimeDesc, &UTC)),
            vec!["evening", "late-day", "early-day"]
        );
    }

    #[test]
    fn default_matches_date_asc_and_input_is_untouched() {
        let tasks = vec![
            task("b", "2024-01-02T09:00:00Z"),
            task("a", "2024-01-01T09:00:00Z"),
        ];
        let refs: Vec<&Task> = tasks.iter().collect();
        let by_default = sort_tasks(&refs, SortOption::Default, &UTC);
        let by_date = sort_tasks(&refs, SortOption::DateAsc, &UTC);
        assert_eq!(ids(&by_default), vec!["a", "b"]);
        assert_eq!(by_default, by_date);
        assert_eq!(ids(&refs), vec!["b", "a"]);
    }

    // Property: with distinct instants, date-desc is exactly the reverse of date-asc.
    proptest! {
        #[test]
        fn property_date_desc_reverses_date_asc(
            offsets in prop::collection::hash_set(0i64..1_000_000i64, 0..40)
        ) {
            let base = fixed_time("2024-01-01T00:00:00Z");
            let offsets: HashSet<i64> = offsets;
            let tasks: Vec<Task> = offsets
                .into_iter()
                .enumerate()
                .map(|(index, minutes)| Task {
                    id: format!("t{index}"),
                    title: "generated".to_string(),
                    description: String::new(),
                    due_date: base + Duration::minutes(minutes),
                    completed: false,
                })
                .collect();
            let refs: Vec<&Task> = tasks.iter().collect();

            let ascending = sort_tasks(&refs, SortOption::DateAsc, &UTC);
            let mut descending = sort_tasks(&refs, SortOption::DateDesc, &UTC);
            descending.reverse();
            prop_assert_eq!(ascending, descending);
        }
    }
}
