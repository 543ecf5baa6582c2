//! Aggregate statistics over the request log.
//!
//! Everything here is a pure function of a record slice: no locks, no clocks.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::analytics::RequestRecord;

pub const TOP_PATHS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCount {
    pub path: String,
    pub count: u64,
}

/// Totals, latency and breakdowns for one time window.
///
/// Grouping maps keep first-seen key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total_requests: u64,
    pub avg_response_time: u64,
    pub min_response_time: u64,
    pub max_response_time: u64,
    pub success_rate: String,
    pub error_rate: String,
    pub by_method: IndexMap<String, u64>,
    pub by_path: IndexMap<String, u64>,
    pub by_status_code: IndexMap<u16, u64>,
    pub top_paths: Vec<PathCount>,
}

impl RequestStats {
    pub fn empty() -> Self {
        Self {
            total_requests: 0,
            avg_response_time: 0,
            min_response_time: 0,
            max_response_time: 0,
            success_rate: percentage(0, 0),
            error_rate: percentage(0, 0),
            by_method: IndexMap::new(),
            by_path: IndexMap::new(),
            by_status_code: IndexMap::new(),
            top_paths: Vec::new(),
        }
    }
}

/// Stats over records with `timestamp >= window_start`, or over all of them.
pub fn compute_stats(
    records: &[RequestRecord],
    window_start: Option<DateTime<Utc>>,
) -> RequestStats {
    let in_window: Vec<&RequestRecord> = records
        .iter()
        .filter(|r| window_start.is_none_or(|start| r.timestamp >= start))
        .collect();

    if in_window.is_empty() {
        return RequestStats::empty();
    }

    let total = in_window.len() as u64;
    let mut sum: u64 = 0;
    let mut min = u64::MAX;
    let mut max = 0;
    let mut successes = 0;
    let mut by_method: IndexMap<String, u64> = IndexMap::new();
    let mut by_path: IndexMap<String, u64> = IndexMap::new();
    let mut by_status_code: IndexMap<u16, u64> = IndexMap::new();

    for record in &in_window {
        sum = sum.saturating_add(record.response_time_ms);
        min = min.min(record.response_time_ms);
        max = max.max(record.response_time_ms);
        if record.status_code < 400 {
            successes += 1;
        }
        *by_method.entry(record.method.clone()).or_default() += 1;
        *by_path.entry(record.path.clone()).or_default() += 1;
        *by_status_code.entry(record.status_code).or_default() += 1;
    }

    RequestStats {
        total_requests: total,
        avg_response_time: (sum as f64 / total as f64).round() as u64,
        min_response_time: min,
        max_response_time: max,
        success_rate: percentage(successes, total),
        error_rate: percentage(total - successes, total),
        top_paths: top_paths(&by_path, TOP_PATHS_LIMIT),
        by_method,
        by_path,
        by_status_code,
    }
}

// stable sort keeps first-seen order among equal counts
fn top_paths(by_path: &IndexMap<String, u64>, limit: usize) -> Vec<PathCount> {
    let mut paths: Vec<PathCount> = by_path
        .iter()
        .map(|(path, count)| PathCount {
            path: path.clone(),
            count: *count,
        })
        .collect();
    paths.sort_by(|a, b| b.count.cmp(&a.count));
    paths.truncate(limit);
    paths
}

fn percentage(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", part as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn rec(offset_ms: i64, method: &str, path: &str, status: u16, ms: u64) -> RequestRecord {
        RequestRecord {
            timestamp: base() + TimeDelta::milliseconds(offset_ms),
            method: method.into(),
            path: path.into(),
            status_code: status,
            response_time_ms: ms,
            client_id: "127.0.0.1".into(),
            user_agent: Some("test".into()),
        }
    }

    #[test]
    fn empty_log_gives_zeroed_stats() {
        let stats = compute_stats(&[], None);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.avg_response_time, 0);
        assert_eq!(stats.min_response_time, 0);
        assert_eq!(stats.max_response_time, 0);
        assert_eq!(stats.success_rate, "0.00");
        assert_eq!(stats.error_rate, "0.00");
        assert!(stats.by_method.is_empty());
        assert!(stats.by_path.is_empty());
        assert!(stats.by_status_code.is_empty());
        assert!(stats.top_paths.is_empty());
    }

    #[test]
    fn half_errors_split_rates_evenly() {
        let records = vec![
            rec(0, "GET", "/a", 200, 10),
            rec(1, "GET", "/a", 200, 20),
            rec(2, "GET", "/b", 404, 30),
            rec(3, "POST", "/b", 404, 41),
        ];
        let stats = compute_stats(&records, None);

        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.success_rate, "50.00");
        assert_eq!(stats.error_rate, "50.00");
        // 101 / 4 = 25.25
        assert_eq!(stats.avg_response_time, 25);
        assert_eq!(stats.min_response_time, 10);
        assert_eq!(stats.max_response_time, 41);
        assert_eq!(stats.by_method["GET"], 3);
        assert_eq!(stats.by_method["POST"], 1);
        assert_eq!(stats.by_status_code[&200u16], 2);
        assert_eq!(stats.by_status_code[&404u16], 2);
        assert!(!stats.by_status_code.contains_key(&500u16));
    }

    #[test]
    fn rates_use_two_decimals() {
        let records = vec![
            rec(0, "GET", "/", 200, 1),
            rec(1, "GET", "/", 200, 1),
            rec(2, "GET", "/", 500, 1),
        ];
        let stats = compute_stats(&records, None);
        assert_eq!(stats.success_rate, "66.67");
        assert_eq!(stats.error_rate, "33.33");
    }

    #[test]
    fn top_paths_break_ties_by_first_seen() {
        let records: Vec<_> = ["/a", "/b", "/a", "/c", "/b", "/a"]
            .iter()
            .enumerate()
            .map(|(i, p)| rec(i as i64, "GET", p, 200, 1))
            .collect();
        let stats = compute_stats(&records, None);

        let order: Vec<_> = stats.top_paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
        assert_eq!(stats.top_paths[0].count, 3);
        assert_eq!(stats.top_paths[2].count, 1);
    }

    #[test]
    fn equal_counts_keep_insertion_order() {
        let records = vec![
            rec(0, "GET", "/z", 200, 1),
            rec(1, "GET", "/y", 200, 1),
            rec(2, "GET", "/x", 200, 1),
        ];
        let stats = compute_stats(&records, None);
        let order: Vec<_> = stats.top_paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(order, vec!["/z", "/y", "/x"]);
    }

    #[test]
    fn top_paths_truncate_to_ten() {
        let records: Vec<_> = (0..15)
            .map(|i| rec(i, "GET", &format!("/p{}", i), 200, 1))
            .collect();
        let stats = compute_stats(&records, None);
        assert_eq!(stats.top_paths.len(), TOP_PATHS_LIMIT);
        assert_eq!(stats.by_path.len(), 15);
    }

    #[test]
    fn window_start_is_inclusive() {
        let records = vec![
            rec(0, "GET", "/old", 200, 1),
            rec(1_000, "GET", "/edge", 200, 1),
            rec(2_000, "GET", "/new", 200, 1),
        ];
        let start = base() + TimeDelta::milliseconds(1_000);
        let stats = compute_stats(&records, Some(start));

        assert_eq!(stats.total_requests, 2);
        assert!(stats.by_path.contains_key("/edge"));
        assert!(!stats.by_path.contains_key("/old"));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let records = vec![
            rec(0, "GET", "/a", 200, 7),
            rec(1, "DELETE", "/b", 404, 9),
        ];
        let first = compute_stats(&records, None);
        let second = compute_stats(&records, None);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let stats = compute_stats(&[rec(0, "GET", "/a", 201, 5)], None);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalRequests"], 1);
        assert_eq!(json["successRate"], "100.00");
        assert_eq!(json["byStatusCode"]["201"], 1);
        assert_eq!(json["topPaths"][0]["path"], "/a");
    }
}
