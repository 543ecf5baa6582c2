use axum::{
    extract::{Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ConfigError, RecordError};
use crate::rate_limit::client_id;
use crate::state::AppState;

/// One completed request, captured after the response was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub response_time_ms: u64,
    pub client_id: String,
    pub user_agent: Option<String>,
}

impl RequestRecord {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.method.is_empty() {
            return Err(RecordError::EmptyMethod);
        }
        if !self.path.starts_with('/') {
            return Err(RecordError::RelativePath(self.path.clone()));
        }
        Ok(())
    }
}

/// Bounded, append-only log of request records. Oldest entries fall off first.
pub struct RequestRecorder {
    records: Mutex<VecDeque<RequestRecord>>,
    capacity: usize,
    slow_threshold: Duration,
}

impl RequestRecorder {
    pub fn new(capacity: usize, slow_threshold: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            records: Mutex::new(VecDeque::new()),
            capacity,
            slow_threshold,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&self, record: RequestRecord) -> Result<(), RecordError> {
        record.validate()?;

        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the log in insertion order.
    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn is_slow(&self, elapsed_ms: u64) -> bool {
        u128::from(elapsed_ms) > self.slow_threshold.as_millis()
    }

    /// Store a finished request, logging instead of failing when the record is unusable.
    pub fn observe(&self, record: RequestRecord) {
        if self.is_slow(record.response_time_ms) {
            tracing::warn!(
                method = %record.method,
                path = %record.path,
                elapsed_ms = record.response_time_ms,
                "Slow request detected"
            );
        }

        if let Err(e) = self.append(record) {
            tracing::error!(error = %e, "Dropping request record");
        }
    }
}

/// Records the outcome of every request that made it past the rate limiter.
pub async fn record_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client = client_id(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    state.accounting.recorder().observe(RequestRecord {
        timestamp: Utc::now(),
        method,
        path,
        status_code: response.status().as_u16(),
        response_time_ms: started.elapsed().as_millis() as u64,
        client_id: client,
        user_agent,
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn record(i: i64) -> RequestRecord {
        RequestRecord {
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
                + TimeDelta::milliseconds(i),
            method: "GET".into(),
            path: format!("/r/{}", i),
            status_code: 200,
            response_time_ms: 3,
            client_id: "127.0.0.1".into(),
            user_agent: None,
        }
    }

    #[test]
    fn keeps_only_the_most_recent_records() {
        let recorder = RequestRecorder::new(1000, Duration::from_secs(1)).unwrap();
        for i in 0..1005 {
            recorder.append(record(i)).unwrap();
        }

        assert_eq!(recorder.len(), 1000);
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.first().unwrap().path, "/r/5");
        assert_eq!(snapshot.last().unwrap().path, "/r/1004");
        assert!(snapshot.iter().all(|r| r.path != "/r/0" && r.path != "/r/4"));
        assert!(snapshot.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn small_capacity_evicts_in_fifo_order() {
        let recorder = RequestRecorder::new(3, Duration::from_secs(1)).unwrap();
        for i in 0..5 {
            recorder.append(record(i)).unwrap();
        }
        let paths: Vec<_> = recorder.snapshot().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/r/2", "/r/3", "/r/4"]);
    }

    #[test]
    fn malformed_record_is_dropped_quietly() {
        let recorder = RequestRecorder::new(10, Duration::from_secs(1)).unwrap();

        let mut bad = record(1);
        bad.method.clear();
        assert_eq!(recorder.append(bad.clone()), Err(RecordError::EmptyMethod));

        recorder.observe(bad);
        let mut relative = record(2);
        relative.path = "no-slash".into();
        recorder.observe(relative);

        assert!(recorder.is_empty());
    }

    #[test]
    fn clear_empties_the_log() {
        let recorder = RequestRecorder::new(10, Duration::from_secs(1)).unwrap();
        recorder.observe(record(1));
        recorder.observe(record(2));
        assert_eq!(recorder.len(), 2);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn slow_threshold_is_exclusive() {
        let recorder = RequestRecorder::new(10, Duration::from_millis(1000)).unwrap();
        assert!(!recorder.is_slow(0));
        assert!(!recorder.is_slow(1000));
        assert!(recorder.is_slow(1001));
    }

    #[test]
    fn slow_requests_are_still_recorded() {
        let recorder = RequestRecorder::new(10, Duration::from_millis(5)).unwrap();
        let mut slow = record(1);
        slow.response_time_ms = 2_500;
        recorder.observe(slow);

        assert_eq!(recorder.snapshot()[0].response_time_ms, 2_500);
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let recorder = RequestRecorder::new(usize::MAX, Duration::from_secs(1)).unwrap();
        recorder.append(record(1)).unwrap();
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.capacity(), usize::MAX);
    }

    #[test]
    fn zero_capacity_is_refused() {
        assert!(matches!(
            RequestRecorder::new(0, Duration::from_secs(1)),
            Err(ConfigError::ZeroCapacity)
        ));
    }
}
