use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// POST /api/users body
#[derive(Deserialize, Debug, Default)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(AppError::BadRequest(
                "Invalid status. Must be: todo, in-progress, or done".to_string(),
            )),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(AppError::BadRequest(
                "Invalid priority. Must be: low, medium, or high".to_string(),
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

// POST /api/tasks and PUT /api/tasks/{id} body; status and priority are
// kept as strings so bad values get a readable 400
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl TaskPayload {
    pub fn parsed_status(&self) -> Result<Option<TaskStatus>, AppError> {
        self.status.as_deref().map(str::parse::<TaskStatus>).transpose()
    }

    pub fn parsed_priority(&self) -> Result<Option<Priority>, AppError> {
        self.priority.as_deref().map(str::parse::<Priority>).transpose()
    }
}

// GET /api/tasks filters
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = &self.status {
            if task.status.to_string() != *status {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if task.priority.to_string() != *priority {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            let wanted = assignee.to_lowercase();
            let found = task
                .assignee
                .as_ref()
                .is_some_and(|a| a.to_lowercase().contains(&wanted));
            if !found {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: 1,
            title: "Setup CI/CD Pipeline".into(),
            description: "Configure automated testing".into(),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            assignee: Some("Jane Smith".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            due_date: None,
            tags: vec![],
        }
    }

    #[test]
    fn status_round_trips_through_kebab_case() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::InProgress.to_string(), "in-progress");
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn query_filters_combine() {
        let task = task();
        let query = TaskQuery {
            status: Some("in-progress".into()),
            assignee: Some("jane".into()),
            search: Some("pipeline".into()),
            ..TaskQuery::default()
        };
        assert!(query.matches(&task));

        let wrong_priority = TaskQuery {
            priority: Some("low".into()),
            ..TaskQuery::default()
        };
        assert!(!wrong_priority.matches(&task));
    }

    #[test]
    fn invalid_priority_in_payload_is_bad_request() {
        let payload = TaskPayload {
            priority: Some("urgent".into()),
            ..TaskPayload::default()
        };
        assert!(matches!(payload.parsed_priority(), Err(AppError::BadRequest(_))));
    }
}
