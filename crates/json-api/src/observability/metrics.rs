//! Prometheus metrics for HTTP traffic and the request guards, plus the
//! exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder, core::Collector,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

use reel_app::errors::FailureKind;

const DURATION_BUCKETS: [f64; 13] = [
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    rejections_total: IntCounterVec,
    admission_denials_total: IntCounter,
    edit_conflicts_total: IntCounter,
    store_timeouts_total: IntCounterVec,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        let Some(metrics) = metrics() else {
            return Self { tracked: false };
        };

        metrics.requests_in_flight.inc();

        Self { tracked: true }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_code_label = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class(status_code), status_code_label.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Count a request turned away by the per-client limiter.
pub(crate) fn record_admission_denied() {
    if let Some(metrics) = metrics() {
        metrics.admission_denials_total.inc();
    }

    record_rejection(FailureKind::AdmissionDenied);
}

/// Count a failed `operation` by kind. Conflicts and store timeouts also feed
/// their own counters.
pub(crate) fn record_failure(operation: &str, kind: FailureKind) {
    if let Some(metrics) = metrics() {
        match kind {
            FailureKind::Conflict => metrics.edit_conflicts_total.inc(),
            FailureKind::Timeout => metrics
                .store_timeouts_total
                .with_label_values(&[operation])
                .inc(),
            _ => {}
        }
    }

    record_rejection(kind);
}

fn record_rejection(kind: FailureKind) {
    let Some(metrics) = metrics() else {
        return;
    };

    metrics
        .rejections_total
        .with_label_values(&[kind.to_string().as_str()])
        .inc();
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metrics.registry.gather(), &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    match HeaderValue::from_str(encoder.format_type()) {
        Ok(content_type) => {
            res.headers_mut().insert(CONTENT_TYPE, content_type);
            res.render(String::from_utf8_lossy(&encoded).into_owned());
        }
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = register(
        &registry,
        "requests_total",
        IntCounterVec::new(
            Opts::new(
                "reel_json_http_requests_total",
                "HTTP requests by method, route, status class, and status code.",
            ),
            &["method", "route", "status_class", "status_code"],
        ),
    )?;

    let request_duration_seconds = register(
        &registry,
        "request_duration_seconds",
        HistogramVec::new(
            HistogramOpts::new(
                "reel_json_http_request_duration_seconds",
                "HTTP request processing time in seconds by method and route.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "route"],
        ),
    )?;

    let requests_in_flight = register(
        &registry,
        "requests_in_flight",
        IntGauge::with_opts(Opts::new(
            "reel_json_http_requests_in_flight",
            "HTTP requests currently being processed.",
        )),
    )?;

    let rejections_total = register(
        &registry,
        "rejections_total",
        IntCounterVec::new(
            Opts::new(
                "reel_json_rejections_total",
                "Requests that failed, by failure kind.",
            ),
            &["kind"],
        ),
    )?;

    let admission_denials_total = register(
        &registry,
        "admission_denials_total",
        IntCounter::with_opts(Opts::new(
            "reel_json_admission_denials_total",
            "Requests denied by the per-client rate limiter.",
        )),
    )?;

    let edit_conflicts_total = register(
        &registry,
        "edit_conflicts_total",
        IntCounter::with_opts(Opts::new(
            "reel_json_edit_conflicts_total",
            "Writes rejected because the record version had moved on.",
        )),
    )?;

    let store_timeouts_total = register(
        &registry,
        "store_timeouts_total",
        IntCounterVec::new(
            Opts::new(
                "reel_json_store_timeouts_total",
                "Backing store calls that exceeded their deadline, by operation.",
            ),
            &["operation"],
        ),
    )?;

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        rejections_total,
        admission_denials_total,
        edit_conflicts_total,
        store_timeouts_total,
    })
}

fn register<M>(registry: &Registry, name: &str, metric: prometheus::Result<M>) -> Option<M>
where
    M: Collector + Clone + 'static,
{
    let metric = match metric {
        Ok(metric) => metric,
        Err(source) => {
            error!(metric = name, "failed to create metric: {source}");
            return None;
        }
    };

    if let Err(source) = registry.register(Box::new(metric.clone())) {
        error!(metric = name, "failed to register metric: {source}");
        return None;
    }

    Some(metric)
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
