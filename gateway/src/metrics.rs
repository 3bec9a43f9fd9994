//! `/metrics` exposed in Prometheus text format, via the `prometheus` crate's own registry
//! rather than the process-global default registry — grounded on spec.md's explicit
//! carry-forward of Prometheus metrics wiring as an ambient concern even though the distilled
//! spec scopes the full metrics *design* out as a collaborator (see DESIGN.md).

use std::time::{Duration, Instant};

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::ContentType;
use rocket::{get, routes, Data, Request, Response, Route, State};

use crate::state::AppState;

pub struct GatewayMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    feed_cache_actual: IntGauge,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("gateway_http_requests_total", "Total HTTP requests handled by the gateway"),
            &["path", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "gateway_http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["path"],
        )?;
        let feed_cache_actual = IntGauge::new(
            "gateway_feed_cache_actual",
            "Current number of entries held in the local feed cache",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(feed_cache_actual.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            feed_cache_actual,
        })
    }

    pub fn observe_request(&self, path: &str, status: u16, elapsed: Duration) {
        self.requests_total.with_label_values(&[path, &status.to_string()]).inc();
        self.request_duration
            .with_label_values(&[path])
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_feed_cache_actual(&self, actual: i64) {
        self.feed_cache_actual.set(actual);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}

/// Times every request and feeds the result (plus the current feed cache size) into
/// `GatewayMetrics`. A timing fairing pair is the standard Rocket idiom: `on_request` stashes
/// a `Instant` in request-local state, `on_response` reads the same cache slot back out.
pub struct MetricsFairing;

#[rocket::async_trait]
impl Fairing for MetricsFairing {
    fn info(&self) -> Info {
        Info {
            name: "request metrics",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let Some(state) = req.rocket().state::<AppState>() else {
            return;
        };
        let start = req.local_cache(Instant::now);
        state
            .metrics
            .observe_request(req.uri().path().as_str(), res.status().code, start.elapsed());
        state.metrics.set_feed_cache_actual(state.feed_cache.actual().await as i64);
    }
}

#[get("/metrics")]
fn metrics_route(state: &State<AppState>) -> (ContentType, String) {
    (ContentType::Plain, state.metrics.encode().unwrap_or_default())
}

pub fn routes() -> Vec<Route> {
    routes![metrics_route]
}
