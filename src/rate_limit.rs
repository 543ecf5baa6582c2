use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, ConfigError};
use crate::metrics::RATE_LIMIT_REJECTIONS;
use crate::state::AppState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Longest accepted window. Anything above this is refused as misconfiguration.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// Rate limit window - tracks requests per client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Quota figures reported back to the client on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl Quota {
    /// Reset time as whole Unix seconds, rounded up.
    pub fn reset_epoch_secs(&self) -> i64 {
        ceil_div_1000(self.reset_at.timestamp_millis())
    }

    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset_epoch_secs()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit(Quota),
    Reject { quota: Quota, retry_after_secs: u64 },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }

    pub fn quota(&self) -> &Quota {
        match self {
            Decision::Admit(quota) => quota,
            Decision::Reject { quota, .. } => quota,
        }
    }
}

/// Fixed-window request counter keyed by client identifier.
pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    window: TimeDelta,
    max_requests: u32,
    rejection_message: String,
}

impl RateLimiter {
    pub fn new(
        window: Duration,
        max_requests: u32,
        rejection_message: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if window > MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge);
        }
        if max_requests == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        let window = TimeDelta::from_std(window).map_err(|_| ConfigError::WindowTooLarge)?;

        Ok(Self {
            windows: DashMap::new(),
            window,
            max_requests,
            rejection_message: rejection_message.into(),
        })
    }

    pub fn rejection_message(&self) -> &str {
        &self.rejection_message
    }

    /// Count one request from `client_id` at `now` and decide whether it goes through.
    pub fn admit(&self, client_id: &str, now: DateTime<Utc>) -> Decision {
        // sweep every expired window, not only this client's
        self.windows.retain(|_, w| w.window_reset_at > now);

        // the entry guard holds the shard lock until we're done counting
        let mut entry = self
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| self.fresh_window(now));

        // a concurrent sweep may have run before this key was touched
        if entry.window_reset_at <= now {
            *entry = self.fresh_window(now);
        }

        entry.count = entry.count.saturating_add(1);
        let count = entry.count;
        let reset_at = entry.window_reset_at;
        drop(entry);

        if count > self.max_requests {
            let wait_ms = (reset_at - now).num_milliseconds().max(0);
            return Decision::Reject {
                quota: Quota {
                    limit: self.max_requests,
                    remaining: 0,
                    reset_at,
                },
                retry_after_secs: ceil_div_1000(wait_ms) as u64,
            };
        }

        Decision::Admit(Quota {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_at,
        })
    }

    /// Clients holding a window that has not yet expired at `now`.
    pub fn active_clients(&self, now: DateTime<Utc>) -> usize {
        self.windows
            .iter()
            .filter(|w| w.window_reset_at > now)
            .count()
    }

    pub fn window_for(&self, client_id: &str) -> Option<ClientWindow> {
        self.windows.get(client_id).map(|w| *w)
    }

    pub fn reset(&self) {
        self.windows.clear();
    }

    // count starts at zero and is bumped by the caller under the same lock;
    // a reset past the end of the calendar clamps instead of overflowing
    fn fresh_window(&self, now: DateTime<Utc>) -> ClientWindow {
        ClientWindow {
            count: 0,
            window_reset_at: now
                .checked_add_signed(self.window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

fn ceil_div_1000(ms: i64) -> i64 {
    (ms + 999).div_euclid(1000)
}

// Client identifier: peer address when the listener exposes it
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// First interceptor on every request: count it, and short-circuit with a 429 once over quota.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = state.accounting.limiter();
    let client = client_id(&request);

    match limiter.admit(&client, Utc::now()) {
        Decision::Admit(quota) => {
            let mut response = next.run(request).await;
            quota.apply_headers(response.headers_mut());
            response
        }
        Decision::Reject {
            quota,
            retry_after_secs,
        } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            RATE_LIMIT_REJECTIONS.inc();

            let mut response =
                AppError::TooManyRequests(limiter.rejection_message().to_string()).into_response();
            let headers = response.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            quota.apply_headers(headers);
            response
        }
    }
}
