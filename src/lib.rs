//! Demo API server: users/tasks CRUD, health probes, prometheus metrics,
//! and a request-accounting layer (per-client fixed-window rate limiting
//! plus a bounded request log with on-demand statistics).

pub mod accounting;
pub mod analytics;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod stats;
