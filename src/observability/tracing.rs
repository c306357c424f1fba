//! HTTP server instrumentation.
//!
//! # Responsibilities
//! - Extract trace context and baggage from incoming request headers
//! - Start a server span per request, named after the matched route
//! - Hand the request context to handlers through request extensions
//! - Record the response status and end the span
//!
//! Installed with `route_layer`, so [`MatchedPath`] is available and
//! unmatched requests are not traced.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracer;
use opentelemetry_semantic_conventions::trace::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, URL_PATH,
};

use crate::http::request::X_REQUEST_ID;

/// State shared by the instrumentation middleware.
#[derive(Clone)]
pub struct HttpTelemetry {
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
}

impl HttpTelemetry {
    pub fn new(tracer: SdkTracer, propagator: Arc<TextMapCompositePropagator>) -> Self {
        Self { tracer, propagator }
    }

    /// Parent context carried by the request headers, if any.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }
}

impl std::fmt::Debug for HttpTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTelemetry").finish_non_exhaustive()
    }
}

/// Middleware: one server span per routed request.
pub async fn trace_requests(
    State(telemetry): State<HttpTelemetry>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let parent = telemetry.extract(request.headers());

    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| path.clone());

    let mut attributes = vec![
        KeyValue::new(HTTP_REQUEST_METHOD, method.clone()),
        KeyValue::new(HTTP_ROUTE, route.clone()),
        KeyValue::new(URL_PATH, path),
    ];
    if let Some(id) = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
    {
        attributes.push(KeyValue::new("http.request.id", id.to_owned()));
    }

    let span = telemetry
        .tracer
        .span_builder(format!("{method} {route}"))
        .with_kind(SpanKind::Server)
        .with_attributes(attributes)
        .start_with_context(&telemetry.tracer, &parent);
    let cx = parent.with_span(span);

    request.extensions_mut().insert(cx.clone());
    let response = next.run(request).await;

    let status = response.status();
    let span = cx.span();
    span.set_attribute(KeyValue::new(
        HTTP_RESPONSE_STATUS_CODE,
        i64::from(status.as_u16()),
    ));
    if status.is_server_error() {
        span.set_status(Status::error(status.to_string()));
    }
    span.end();

    response
}

/// Reads propagation fields from HTTP headers.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}
