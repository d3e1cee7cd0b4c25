use crate::domain::classifier::{TaskBucket, classify_tasks};
use crate::domain::datetime::{
    format_due_date, format_due_time, format_long_date, is_overdue, local_day, relative_label,
};
use crate::domain::filter::TaskFilter;
use crate::domain::models::Task;
use crate::domain::sorter::{SortOption, sort_tasks};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Order in which groups are shown.
pub const GROUP_ORDER: [TaskBucket; 3] =
    [TaskBucket::Today, TaskBucket::Upcoming, TaskBucket::Overdue];

const NO_DESCRIPTION: &str = "No description provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTone {
    Today,
    Overdue,
    Completed,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Completed,
    Today,
    Overdue,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Today => "Today",
            Self::Overdue => "Overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_line: String,
    pub status: String,
    pub badges: Vec<Badge>,
    pub tone: CardTone,
}

impl TaskCard {
    pub fn build(task: &Task, bucket: TaskBucket, now: DateTime<Utc>, tz: &Tz) -> Self {
        let in_today = bucket == TaskBucket::Today;
        let overdue = is_overdue(task.due_date, task.completed, now);

        let mut badges = Vec::new();
        if task.completed {
            badges.push(Badge::Completed);
        }
        if in_today && !overdue && !task.completed {
            badges.push(Badge::Today);
        }
        if overdue {
            badges.push(Badge::Overdue);
        }

        let tone = if in_today {
            CardTone::Today
        } else if overdue {
            CardTone::Overdue
        } else if task.completed {
            CardTone::Completed
        } else {
            CardTone::Plain
        };

        let description = if task.description.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            task.description.clone()
        };

        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description,
            due_line: format!(
                "Due: {} at {}",
                format_due_date(task.due_date, tz),
                format_due_time(task.due_date, tz)
            ),
            status: relative_label(task.due_date, task.completed, now),
            badges,
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub bucket: TaskBucket,
    pub cards: Vec<TaskCard>,
}

impl TaskGroup {
    pub fn heading(&self) -> String {
        format!("{} ({})", self.bucket.heading(), self.cards.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    NoTasks,
    NoMatches { filter_active: bool },
    Groups(Vec<TaskGroup>),
}

/// One render pass of the task list: filter, then classify against `now`,
/// then sort each group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListView {
    pub outcome: ListOutcome,
    pub matched: usize,
    pub filter_active: bool,
}

impl TaskListView {
    pub fn build(
        tasks: &[Task],
        filter: &TaskFilter,
        sort: SortOption,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let filter_active = filter.is_active();
        if tasks.is_empty() {
            return Self {
                outcome: ListOutcome::NoTasks,
                matched: 0,
                filter_active,
            };
        }

        let filtered = filter.apply(tasks, tz);
        let matched = filtered.len();
        if filtered.is_empty() {
            return Self {
                outcome: ListOutcome::NoMatches { filter_active },
                matched,
                filter_active,
            };
        }

        let classified = classify_tasks(filtered, now, tz);
        let groups = GROUP_ORDER
            .into_iter()
            .filter_map(|bucket| {
                let members = classified.bucket(bucket);
                if members.is_empty() {
                    return None;
                }
                let cards = sort_tasks(members, sort, tz)
                    .into_iter()
                    .map(|task| TaskCard::build(task, bucket, now, tz))
                    .collect();
                Some(TaskGroup { bucket, cards })
            })
            .collect();

        Self {
            outcome: ListOutcome::Groups(groups),
            matched,
            filter_active,
        }
    }

    /// "3 tasks total" or "1 task match filters"; absent when there are no tasks at all.
    pub fn counter_line(&self) -> Option<String> {
        if self.outcome == ListOutcome::NoTasks {
            return None;
        }
        let noun = if self.matched == 1 { "task" } else { "tasks" };
        let suffix = if self.filter_active {
            "match filters"
        } else {
            "total"
        };
        Some(format!("{} {noun} {suffix}", self.matched))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub greeting: String,
    pub date_line: String,
    pub total: usize,
    pub completed: usize,
    pub due_today: usize,
    pub overdue: usize,
}

impl DashboardSummary {
    pub fn build(display_name: &str, tasks: &[Task], now: DateTime<Utc>, tz: &Tz) -> Self {
        let today = local_day(now, tz);
        Self {
            greeting: format!("Welcome, {display_name}"),
            date_line: format_long_date(now, tz),
            total: tasks.len(),
            completed: tasks.iter().filter(|task| task.completed).count(),
            due_today: tasks
                .iter()
                .filter(|task| local_day(task.due_date, tz) == today)
                .count(),
            overdue: tasks
                .iter()
                .filter(|task| is_overdue(task.due_date, task.completed, now))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn task(id: &str, due: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            due_date: fixed_time(due),
            completed,
        }
    }

    fn group_ids(view: &TaskListView) -> Vec<(TaskBucket, Vec<String>)> {
        match &view.outcome {
            ListOutcome::Groups(groups) => groups
                .iter()
                .map(|group| {
                    (
                        group.bucket,
                        group.cards.iter().map(|card| card.id.clone()).collect(),
                    )
                })
                .collect(),
            other => panic!("expected groups, got {other:?}"),
        }
    }

    #[test]
    fn empty_list_reports_no_tasks() {
        let view = TaskListView::build(
            &[],
            &TaskFilter::default(),
            SortOption::Default,
            fixed_time("2024-01-01T12:00:00Z"),
            &UTC,
        );
        assert_eq!(view.outcome, ListOutcome::NoTasks);
        assert_eq!(view.counter_line(), None);
    }

    #[test]
    fn same_day_tasks_sorted_by_time() {
        let tasks = vec![
            task("afternoon", "2024-01-01T15:00:00Z", false),
            task("morning", "2024-01-01T09:00:00Z", false),
        ];
        let view = TaskListView::build(
            &tasks,
            &TaskFilter::default(),
            SortOption::TimeAsc,
            fixed_time("2024-01-01T12:00:00Z"),
            &UTC,
        );
        assert_eq!(
            group_ids(&view),
            vec![(
                TaskBucket::Today,
                vec!["morning".to_string(), "afternoon".to_string()]
            )]
        );
        assert_eq!(view.counter_line().as_deref(), Some("2 tasks total"));
    }

    #[test]
    fn groups_render_today_upcoming_overdue() {
        let tasks = vec![
            task("late", "2023-12-30T09:00:00Z", false),
            task("next-week", "2024-01-08T09:00:00Z", false),
            task("now-ish", "2024-01-01T18:00:00Z", false),
            task("done-past", "2023-12-29T09:00:00Z", true),
        ];
        let view = TaskListView::build(
            &tasks,
            &TaskFilter::default(),
            SortOption::Default,
            fixed_time("2024-01-01T12:00:00Z"),
            &UTC,
        );
        let buckets: Vec<TaskBucket> = group_ids(&view).into_iter().map(|(bucket, _)| bucket).collect();
        assert_eq!(
            buckets,
            vec![TaskBucket::Today, TaskBucket::Upcoming, TaskBucket::Overdue]
        );
        assert_eq!(
            group_ids(&view)[1].1,
            vec!["done-past".to_string(), "next-week".to_string()]
        );
    }

    #[test]
    fn filter_removing_everything_reports_no_matches() {
        let tasks = vec![task("early", "2024-01-01T08:59:00Z", false)];
        let filter = TaskFilter::parse(None, None, Some("09:00"), Some("17:00")).expect("filter");
        let view = TaskListView::build(
            &tasks,
            &filter,
            SortOption::Default,
            fixed_time("2024-01-01T12:00:00Z"),
            &UTC,
        );
        assert_eq!(view.outcome, ListOutcome::NoMatches { filter_active: true });
        assert_eq!(view.counter_line().as_deref(), Some("0 tasks match filters"));
    }

    #[test]
    fn overdue_card_shows_badge_and_label() {
        let now = fixed_time("2024-01-02T09:00:00Z");
        let overdue = task("a", "2024-01-01T09:00:00Z", false);
        let card = TaskCard::build(&overdue, TaskBucket::Overdue, now, &UTC);
        assert_eq!(card.status, "1 day overdue");
        assert_eq!(card.badges, vec![Badge::Overdue]);
        assert_eq!(card.tone, CardTone::Overdue);
        assert_eq!(card.description, "No description provided");
        assert_eq!(card.due_line, "Due: Jan 1, 2024 at 09:00 AM");
    }

    #[test]
    fn today_card_badges() {
        let now = fixed_time("2024-01-01T12:00:00Z");
        let ahead = task("ahead", "2024-01-01T15:00:00Z", false);
        let card = TaskCard::build(&ahead, TaskBucket::Today, now, &UTC);
        assert_eq!(card.badges, vec![Badge::Today]);
        assert_eq!(card.tone, CardTone::Today);

        let missed = task("missed", "2024-01-01T09:00:00Z", false);
        let card = TaskCard::build(&missed, TaskBucket::Today, now, &UTC);
        assert_eq!(card.badges, vec![Badge::Overdue]);
        assert_eq!(card.tone, CardTone::Today);

        let done = task("done", "2024-01-01T09:00:00Z", true);
        let card = TaskCard::build(&done, TaskBucket::Today, now, &UTC);
        assert_eq!(card.badges, vec![Badge::Completed]);
        assert_eq!(card.status, "Completed");
    }

    #[test]
    fn dashboard_counts() {
        let now = fixed_time("2026-10-18T12:00:00Z");
        let tasks = vec![
            task("today-done", "2026-10-18T08:00:00Z", true),
            task("today-later", "2026-10-18T20:00:00Z", false),
            task("yesterday", "2026-10-17T09:00:00Z", false),
            task("tomorrow", "2026-10-19T09:00:00Z", false),
        ];
        let summary = DashboardSummary::build("Ada", &tasks, now, &UTC);
        assert_eq!(summary.greeting, "Welcome, Ada");
        assert_eq!(summary.date_line, "Sunday, October 18, 2026");
        assert_eq!(summary.total, 4);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.due_today, 2);
        assert_eq!(summary.overdue, 1);
    }
}
