use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Index page cache events (hit/miss/write/clear/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "blog_page_cache_events_total",
        "Index page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register blog_page_cache_events_total");

    /// Writes to posts, comments and follows segmented by kind and outcome.
    pub static ref MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_mutations_total",
        "Blog mutations segmented by kind and outcome",
        &["kind", "outcome"]
    )
    .expect("failed to register blog_mutations_total");

    /// HTTP request duration by method, route pattern and status class.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register blog_http_request_duration_seconds");
}

pub fn record_cache_event(event: &str) {
    PAGE_CACHE_EVENTS.with_label_values(&[event]).inc();
}

pub fn record_mutation(kind: &str, outcome: &str) {
    MUTATIONS_TOTAL.with_label_values(&[kind, outcome]).inc();
}
