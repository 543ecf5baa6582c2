use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::analytics::RequestRecorder;
use crate::config::AccountingConfig;
use crate::error::ConfigError;
use crate::rate_limit::RateLimiter;
use crate::stats::{RequestStats, compute_stats};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub active_clients: usize,
    pub total_records: usize,
}

/// Report served to the analytics routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllStats {
    pub last_hour: RequestStats,
    pub last_day: RequestStats,
    pub all: RequestStats,
    pub records_count: usize,
    pub rate_limit_status: RateLimitStatus,
}

// Rate limiter + request log, owned together and shared through AppState
pub struct RequestAccounting {
    limiter: RateLimiter,
    recorder: RequestRecorder,
}

impl RequestAccounting {
    pub fn new(config: &AccountingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            limiter: RateLimiter::new(
                config.window,
                config.max_requests,
                config.rejection_message.clone(),
            )?,
            recorder: RequestRecorder::new(config.log_capacity, config.slow_request_threshold)?,
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn recorder(&self) -> &RequestRecorder {
        &self.recorder
    }

    pub fn get_all_stats(&self) -> AllStats {
        self.get_all_stats_at(Utc::now())
    }

    pub fn get_all_stats_at(&self, now: DateTime<Utc>) -> AllStats {
        // work on a copy so the log lock isn't held while aggregating
        let records = self.recorder.snapshot();

        AllStats {
            last_hour: compute_stats(&records, Some(now - TimeDelta::hours(1))),
            last_day: compute_stats(&records, Some(now - TimeDelta::days(1))),
            all: compute_stats(&records, None),
            records_count: records.len(),
            rate_limit_status: RateLimitStatus {
                active_clients: self.limiter.active_clients(now),
                total_records: records.len(),
            },
        }
    }

    pub fn reset_all(&self) {
        self.recorder.clear();
        self.limiter.reset();
        tracing::info!("Analytics and rate limit state reset");
    }
}
