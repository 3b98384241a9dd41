use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type TaskId = Uuid;
pub type UserId = Uuid;

/// An authenticated account, as the auth service describes it.
///
/// Also stored verbatim in the `tasks.assignee` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
}

/// Kanban column a task sits in. The wire names match the `tasks.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "TODO")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "DONE")]
    Done,
}

impl TaskStatus {
    /// Columns in display order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = RowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| RowError::UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = RowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| RowError::UnknownPriority(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub board_id: BoardId,
    pub content: String,
    pub status: TaskStatus,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<User>,
    pub issue: Option<String>,
}

impl Task {
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }
}

/// A `tasks` row exactly as the row service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: TaskId,
    pub board_id: BoardId,
    pub content: String,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("unknown task status {0:?}")]
    UnknownStatus(String),
    #[error("unknown task priority {0:?}")]
    UnknownPriority(String),
}

impl TryFrom<TaskRow> for Task {
    type Error = RowError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row.status.parse()?;
        // Rows written before priorities existed carry null.
        let priority = match row.priority.as_deref() {
            Some(value) => value.parse()?,
            None => Priority::default(),
        };

        Ok(Task {
            id: row.id,
            board_id: row.board_id,
            content: row.content,
            status,
            description: row.description,
            priority,
            due_date: row.due_date.as_deref().and_then(parse_due_date),
            assignee: row.assignee,
            issue: row.issue,
        })
    }
}

/// Maps fetched rows into tasks, skipping rows that violate the status/priority enums.
pub fn map_rows(rows: Vec<TaskRow>) -> Vec<Task> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Task::try_from(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    log::warn!("skipping task row {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Accepts a bare date or a full timestamp; the calendar date is kept in the value's own offset.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.date())
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBoard {
    pub name: String,
}

/// Insert payload for a task created from a column's inline input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub board_id: BoardId,
    pub content: String,
    pub status: TaskStatus,
    pub priority: Priority,
}

impl NewTask {
    pub fn new(board_id: BoardId, content: String, status: TaskStatus) -> Self {
        Self {
            board_id,
            content,
            status,
            priority: Priority::Medium,
        }
    }
}

/// Full-field update written by the edit dialog. `None` clears the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskChanges {
    pub content: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub issue: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<User>,
}

impl From<&Task> for TaskChanges {
    fn from(task: &Task) -> Self {
        Self {
            content: task.content.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            issue: task.issue.clone(),
            due_date: task.due_date,
            assignee: task.assignee.clone(),
        }
    }
}

/// Single-field update issued when a card is dropped on another column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: TaskStatus,
}

/// Connection values the host publishes for the browser app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub remote_url: String,
    pub anon_key: String,
}
