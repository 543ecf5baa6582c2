use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, HistogramVec, register_counter, register_counter_vec,
    register_gauge, register_histogram_vec,
};
use std::time::Instant;

const LABELS: &[&str] = &["method", "route", "status_code"];

lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec =
        register_counter_vec!("http_requests_total", "Total number of HTTP requests", LABELS)
            .unwrap();
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "Duration of HTTP requests in seconds",
        LABELS,
        vec![0.1, 0.5, 1.0, 2.0, 5.0]
    )
    .unwrap();
    pub static ref ACTIVE_CONNECTIONS: Gauge =
        register_gauge!("http_active_connections", "Number of active HTTP connections").unwrap();
    pub static ref RATE_LIMIT_REJECTIONS: Counter = register_counter!(
        "rate_limit_rejections_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
}

// Holds one slot in a gauge until dropped, so a request abandoned
// mid-flight still gives it back
pub struct GaugeGuard<'a>(&'a Gauge);

impl<'a> GaugeGuard<'a> {
    pub fn acquire(gauge: &'a Gauge) -> Self {
        gauge.inc();
        GaugeGuard(gauge)
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

// Outermost layer: counts everything, 429s included
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let guard = GaugeGuard::acquire(&ACTIVE_CONNECTIONS);
    let response = next.run(request).await;
    drop(guard);

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), route.as_str(), status.as_str()];
    HTTP_REQUEST_DURATION
        .with_label_values(&labels)
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}
