use crate::application::commands::{DashboardResponse, MutationOutcome, TaskListResponse};
use crate::application::task_list::{CardTone, ListOutcome, TaskCard, TaskListView};
use crate::domain::models::UserProfile;
use std::fmt::Write;

const NO_TASKS: &str = "No tasks found. Create a new task to get started.";
const NO_MATCHES: &str = "No tasks match the selected filters.";
const CLEAR_FILTERS_HINT: &str = "Clear filters to see all tasks (run `taskpilot tasks list` without filter flags).";

/// Plain-text views for the terminal. Color is off unless stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn tone_code(tone: CardTone) -> Option<&'static str> {
        match tone {
            CardTone::Today => Some("34"),
            CardTone::Overdue => Some("31"),
            CardTone::Completed => Some("32"),
            CardTone::Plain => None,
        }
    }

    pub fn task_card(&self, card: &TaskCard) -> String {
        let mut out = String::new();
        let mut title = card.title.clone();
        for badge in &card.badges {
            title.push_str(&format!(" [{}]", badge.label()));
        }
        let title = match Self::tone_code(card.tone) {
            Some(code) => self.paint(&title, code),
            None => title,
        };

        let _ = writeln!(out, "  {title}  ({})", card.id);
        let _ = writeln!(out, "    {}", card.description);
        let _ = writeln!(out, "    {}", card.due_line);
        let _ = writeln!(out, "    {}", card.status);
        out
    }

    pub fn task_list(&self, view: &TaskListView) -> String {
        let mut out = String::new();
        if let Some(counter) = view.counter_line() {
            let _ = writeln!(out, "{counter}");
        }

        match &view.outcome {
            ListOutcome::NoTasks => {
                let _ = writeln!(out, "{NO_TASKS}");
            }
            ListOutcome::NoMatches { filter_active } => {
                let _ = writeln!(out, "{NO_MATCHES}");
                if *filter_active {
                    let _ = writeln!(out, "{CLEAR_FILTERS_HINT}");
                }
            }
            ListOutcome::Groups(groups) => {
                for group in groups {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "{}", self.paint(&group.heading(), "1"));
                    for card in &group.cards {
                        out.push_str(&self.task_card(card));
                    }
                }
            }
        }
        out
    }

    pub fn task_list_response(&self, response: &TaskListResponse) -> String {
        let mut out = String::new();
        if response.reversed_time_window {
            let _ = writeln!(
                out,
                "{}",
                self.paint(
                    "warning: start time is after end time; time ranges do not wrap past midnight",
                    "33"
                )
            );
        }
        out.push_str(&self.task_list(&response.view));
        out
    }

    pub fn dashboard(&self, response: &DashboardResponse) -> String {
        let summary = &response.summary;
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.paint(&response.app_name, "36"));
        let _ = writeln!(out, "{}", self.paint(&summary.greeting, "1"));
        let _ = writeln!(out, "{}", summary.date_line);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Tasks    {}", summary.total);
        let _ = writeln!(out, "Completed      {}", summary.completed);
        let _ = writeln!(out, "Today's Tasks  {}", summary.due_today);
        let _ = writeln!(out, "Overdue        {}", summary.overdue);
        let _ = writeln!(out);
        out.push_str(&self.task_list(&response.view));
        out
    }

    pub fn mutation(&self, outcome: &MutationOutcome) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.paint(&outcome.message, "32"));
        match &outcome.tasks {
            Some(tasks) => {
                let noun = if tasks.len() == 1 { "task" } else { "tasks" };
                let _ = writeln!(out, "{} {noun} total", tasks.len());
            }
            None => {
                let _ = writeln!(out, "Task list could not be refreshed; run `taskpilot tasks list`.");
            }
        }
        out
    }

    pub fn profile(&self, user: &UserProfile) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{}] {}", user.initial(), self.paint(user.display_name(), "1"));
        let _ = writeln!(out, "Email: {}", user.email);
        match user.is_account_verified {
            Some(true) => {
                let _ = writeln!(out, "Account verified");
            }
            Some(false) => {
                let _ = writeln!(out, "Account not verified");
            }
            None => {}
        }
        out
    }
}
