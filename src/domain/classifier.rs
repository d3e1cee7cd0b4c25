use crate::domain::datetime::{is_overdue, local_day};
use crate::domain::models::Task;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskBucket {
    Today,
    Overdue,
    Upcoming,
}

impl TaskBucket {
    pub fn heading(self) -> &'static str {
        match self {
            Self::Today => "Today's Tasks",
            Self::Overdue => "Overdue Tasks",
            Self::Upcoming => "Upcoming Tasks",
        }
    }
}

/// Same-day check wins over completion, so a finished task due today stays in Today.
pub fn classify(task: &Task, now: DateTime<Utc>, tz: &Tz) -> TaskBucket {
    if local_day(task.due_date, tz) == local_day(now, tz) {
        TaskBucket::Today
    } else if is_overdue(task.due_date, task.completed, now) {
        TaskBucket::Overdue
    } else {
        TaskBucket::Upcoming
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTasks<'a> {
    pub today: Vec<&'a Task>,
    pub overdue: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
}

impl<'a> ClassifiedTasks<'a> {
    pub fn len(&self) -> usize {
        self.today.len() + self.overdue.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket(&self, bucket: TaskBucket) -> &[&'a Task] {
        match bucket {
            TaskBucket::Today => &self.today,
            TaskBucket::Overdue => &self.overdue,
            TaskBucket::Upcoming => &self.upcoming,
        }
    }
}

/// Partitions tasks into the three buckets, keeping input order inside each.
pub fn classify_tasks<'a, I>(tasks: I, now: DateTime<Utc>, tz: &Tz) -> ClassifiedTasks<'a>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut classified = ClassifiedTasks::default();
    for task in tasks {
        match classify(task, now, tz) {
            TaskBucket::Today => classified.today.push(task),
            TaskBucket::Overdue => classified.overdue.push(task),
            TaskBucket::Upcoming => classified.upcoming.push(task),
        }
    }
    classified
}
