use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::accounting::RequestAccounting;
use crate::config::AccountingConfig;
use crate::error::ConfigError;
use crate::models::{Priority, Task, TaskStatus, User};

// app's shared state
pub struct AppState {
    pub accounting: RequestAccounting,
    pub users: DashMap<u64, User>,
    pub tasks: DashMap<u64, Task>,
    pub environment: String,
    pub started_at: Instant,
    next_user_id: AtomicU64,
    next_task_id: AtomicU64,
}

impl AppState {
    pub fn new(config: &AccountingConfig, environment: impl Into<String>) -> Result<Self, ConfigError> {
        let state = Self {
            accounting: RequestAccounting::new(config)?,
            users: DashMap::new(),
            tasks: DashMap::new(),
            environment: environment.into(),
            started_at: Instant::now(),
            next_user_id: AtomicU64::new(1),
            next_task_id: AtomicU64::new(1),
        };
        state.seed();
        Ok(state)
    }

    pub fn next_user_id(&self) -> u64 {
        self.next_user_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_task_id(&self) -> u64 {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    // demo data so the listing routes aren't empty on boot
    fn seed(&self) {
        let now = Utc::now();

        for (name, email) in [
            ("John Doe", "john@example.com"),
            ("Jane Smith", "jane@example.com"),
        ] {
            let id = self.next_user_id();
            self.users.insert(
                id,
                User {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    created_at: now,
                },
            );
        }

        let seed_tasks = [
            (
                "Setup CI/CD Pipeline",
                "Configure GitHub Actions for automated testing and deployment",
                TaskStatus::Done,
                Priority::High,
                Some("John Doe"),
                vec!["devops", "automation"],
            ),
            (
                "Add monitoring endpoints",
                "Implement health checks and metrics collection",
                TaskStatus::InProgress,
                Priority::Medium,
                Some("Jane Smith"),
                vec!["monitoring", "observability"],
            ),
            (
                "Write API documentation",
                "Create comprehensive API documentation with examples",
                TaskStatus::Todo,
                Priority::Medium,
                None,
                vec!["documentation"],
            ),
        ];

        for (title, description, status, priority, assignee, tags) in seed_tasks {
            let id = self.next_task_id();
            self.tasks.insert(
                id,
                Task {
                    id,
                    title: title.to_string(),
                    description: description.to_string(),
                    status,
                    priority,
                    assignee: assignee.map(str::to_string),
                    created_at: now,
                    updated_at: now,
                    due_date: None,
                    tags: tags.into_iter().map(str::to_string).collect(),
                },
            );
        }
    }
}
