mod analytics;
mod health;
mod metrics;
mod status;
mod tasks;
mod users;

pub use analytics::{
    analytics_handler, methods_handler, performance_handler, status_codes_handler,
    summary_handler,
};
pub use health::{health_handler, live_handler, ready_handler};
pub use metrics::metrics_handler;
pub use status::{error_handler, root_handler, status_handler};
pub use tasks::{
    create_task_handler, delete_task_handler, get_task_handler, list_tasks_handler,
    task_stats_handler, update_task_handler,
};
pub use users::{create_user_handler, get_user_handler, list_users_handler};
