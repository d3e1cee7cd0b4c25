use crate::domain::datetime::{local_instant, split_for_form};
use crate::domain::models::{
    Task, TaskDraft, parse_date, parse_hhmm, validate_date, validate_hhmm, validate_non_empty,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub const DEFAULT_DUE_TIME: &str = "12:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Keeps the stored instant so an untouched date and time round-trip exactly,
    /// seconds included.
    Edit { original_due: DateTime<Utc> },
}

/// Editable state behind the create/edit task form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub mode: FormMode,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub due_time: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            due_time: DEFAULT_DUE_TIME.to_string(),
        }
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit mode: the stored instant is split into local date and time fields.
    pub fn from_task(task: &Task, tz: &Tz) -> Self {
        let (due_date, due_time) = split_for_form(task.due_date, tz);
        Self {
            mode: FormMode::Edit {
                original_due: task.due_date,
            },
            title: task.title.clone(),
            description: task.description.clone(),
            due_date,
            due_time,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "title")?;
        validate_non_empty(&self.description, "description")?;
        validate_non_empty(&self.due_date, "due date")?;
        validate_non_empty(&self.due_time, "due time")?;
        validate_date(&self.due_date, "due date")?;
        validate_hhmm(&self.due_time, "due time")?;
        Ok(())
    }

    /// Recombines date and time into one instant and emits the payload the
    /// gateway sends. Nothing is persisted here.
    pub fn submit(&self, tz: &Tz) -> Result<TaskDraft, String> {
        self.validate()?;
        let date = parse_date(&self.due_date).ok_or("due date must be YYYY-MM-DD")?;
        let time = parse_hhmm(&self.due_time).ok_or("due time must be HH:MM")?;
        if let FormMode::Edit { original_due } = self.mode {
            let (stored_date, stored_time) = split_for_form(original_due, tz);
            if stored_date == self.due_date.trim() && stored_time == self.due_time.trim() {
                return Ok(self.draft(original_due));
            }
        }

        let due_date = local_instant(date, time, tz).ok_or_else(|| {
            format!(
                "{} {} does not exist in timezone {}",
                self.due_date.trim(),
                self.due_time.trim(),
                tz.name()
            )
        })?;
        Ok(self.draft(due_date))
    }

    fn draft(&self, due_date: DateTime<Utc>) -> TaskDraft {
        TaskDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, UTC};

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn stored_task() -> Task {
        Task {
            id: "t-1".to_string(),
            title: "Dentist".to_string(),
            description: "Bring forms".to_string(),
            due_date: fixed_time("2024-03-05T14:30:00Z"),
            completed: false,
        }
    }

    #[test]
    fn create_mode_defaults_to_noon() {
        let form = TaskForm::new();
        assert_eq!(form.mode, FormMode::Create);
        assert_eq!(form.due_time, "12:00");
        assert!(form.due_date.is_empty());
    }

    #[test]
    fn edit_mode_splits_stored_instant() {
        let form = TaskForm::from_task(&stored_task(), &UTC);
        assert_eq!(
            form.mode,
            FormMode::Edit {
                original_due: fixed_time("2024-03-05T14:30:00Z")
            }
        );
        assert_eq!(form.due_date, "2024-03-05");
        assert_eq!(form.due_time, "14:30");
    }

    #[test]
    fn untouched_due_fields_keep_seconds_of_stored_instant() {
        let task = Task {
            due_date: fixed_time("2024-03-05T14:30:45.250Z"),
            ..stored_task()
        };
        let mut form = TaskForm::from_task(&task, &America::New_York);
        form.title = "Dentist (moved)".to_string();
        let draft = form.submit(&America::New_York).expect("submit");
        assert_eq!(draft.due_date, task.due_date);
        assert_eq!(draft.title, "Dentist (moved)");

        form.due_time = "15:00".to_string();
        let draft = form.submit(&America::New_York).expect("submit");
        assert_eq!(draft.due_date, fixed_time("2024-03-05T20:00:00Z"));
    }

    #[test]
    fn unchanged_submit_reproduces_same_instant() {
        let task = stored_task();
        for tz in [UTC, America::New_York, chrono_tz::Asia::Kolkata] {
            let draft = TaskForm::from_task(&task, &tz).submit(&tz).expect("submit");
            assert_eq!(draft.due_date, task.due_date);
            assert_eq!(draft.title, "Dentist");
            assert_eq!(draft.description, "Bring forms");
        }
    }

    #[test]
    fn submit_interprets_fields_in_local_timezone() {
        let form = TaskForm {
            title: "Standup".to_string(),
            description: "daily".to_string(),
            due_date: "2024-07-01".to_string(),
            due_time: "09:15".to_string(),
            ..TaskForm::new()
        };
        let draft = form.submit(&America::New_York).expect("submit");
        assert_eq!(draft.due_date, fixed_time("2024-07-01T13:15:00Z"));
    }

    #[test]
    fn missing_fields_are_rejected_before_submit() {
        let mut form = TaskForm::from_task(&stored_task(), &UTC);
        form.description = "  ".to_string();
        assert!(form.submit(&UTC).is_err());

        let mut form = TaskForm::from_task(&stored_task(), &UTC);
        form.due_date.clear();
        assert!(form.submit(&UTC).unwrap_err().contains("due date"));

        let mut form = TaskForm::from_task(&stored_task(), &UTC);
        form.due_time = "noon".to_string();
        assert!(form.submit(&UTC).unwrap_err().contains("HH:MM"));
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        let form = TaskForm {
            title: "Gap".to_string(),
            description: "spring forward".to_string(),
            due_date: "2024-03-10".to_string(),
            due_time: "02:30".to_string(),
            ..TaskForm::new()
        };
        assert!(form.submit(&America::New_York).is_err());
        assert!(form.submit(&UTC).is_ok());
    }
}
