use chrono::NaiveDate;
use shared::{Priority, Task, TaskId, User};

/// Editable copy of a task opened from its card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDialog {
    task_id: TaskId,
    pub content: String,
    pub description: String,
    pub issue: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<User>,
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl TaskDialog {
    pub fn open(task: &Task) -> Self {
        Self {
            task_id: task.id,
            content: task.content.clone(),
            description: task.description.clone().unwrap_or_default(),
            issue: task.issue.clone().unwrap_or_default(),
            priority: task.priority,
            due_date: task.due_date,
            assignee: task.assignee.clone(),
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Flips between no assignee and `current`.
    pub fn toggle_assignee(&mut self, current: Option<&User>) {
        self.assignee = match self.assignee {
            Some(_) => None,
            None => current.cloned(),
        };
    }

    /// Takes the value of a date input; an empty or unreadable value clears the date.
    pub fn set_due_date(&mut self, input: &str) {
        self.due_date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok();
    }

    pub fn due_date_input(&self) -> String {
        self.due_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Writes the edited fields over `current`, leaving fields the dialog does not edit alone.
    pub fn apply_to(&self, current: &Task) -> Task {
        Task {
            content: self.content.clone(),
            description: non_blank(&self.description),
            issue: non_blank(&self.issue),
            priority: self.priority,
            due_date: self.due_date,
            assignee: self.assignee.clone(),
            ..current.clone()
        }
    }
}
