use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use prometheus::{HistogramVec, IntCounterVec};
use std::rc::Rc;
use std::time::Instant;

const REQUEST_LABELS: &[&str] = &["service", "method", "route", "status"];

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        REQUEST_LABELS
    ).expect("Prometheus metrics registration should succeed at startup");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency",
        REQUEST_LABELS,
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Request counters and latency histograms for one service.
///
/// The `route` label is the matched pattern (`/api/v1/posts/{post_id}`), not
/// the raw path. Requests that match no route share the `unmatched` label.
#[derive(Clone, Copy)]
pub struct MetricsMiddleware {
    service: &'static str,
}

impl MetricsMiddleware {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            inner: Rc::new(service),
            service_name: self.service,
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    inner: Rc<S>,
    service_name: &'static str,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(inner);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let inner = self.inner.clone();
        let service_name = self.service_name;
        let started = Instant::now();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());

        Box::pin(async move {
            let res = inner.call(req).await;
            let status = match &res {
                Ok(response) => response.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let status = status.as_u16().to_string();
            let labels = [service_name, method.as_str(), route.as_str(), status.as_str()];

            HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&labels)
                .observe(started.elapsed().as_secs_f64());

            res
        })
    }
}
