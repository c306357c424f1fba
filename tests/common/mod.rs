//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use opentelemetry_sdk::Resource;
use rolldice::config::ServiceConfig;
use rolldice::http::{AppState, HttpServer};
use rolldice::lifecycle::Shutdown;
use rolldice::observability::{
    setup_with, DiceMetrics, ProviderFactory, Telemetry, TelemetryEnv, TelemetryError,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Spans go to memory, metrics are recorded but never exported.
pub struct InMemoryProviders {
    pub spans: InMemorySpanExporter,
}

impl ProviderFactory for InMemoryProviders {
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, TelemetryError> {
        Ok(SdkTracerProvider::builder()
            .with_simple_exporter(self.spans.clone())
            .with_resource(resource)
            .build())
    }

    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, TelemetryError> {
        Ok(SdkMeterProvider::builder().with_resource(resource).build())
    }
}

/// A running service on an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub spans: InMemorySpanExporter,
    pub telemetry: Telemetry,
    pub shutdown: Shutdown,
    pub server: JoinHandle<Result<(), std::io::Error>>,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Finished spans with the given name.
    #[allow(dead_code)]
    pub fn spans_named(&self, name: &str) -> Vec<SpanData> {
        self.spans
            .get_finished_spans()
            .unwrap()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }
}

pub async fn start_service() -> TestService {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.telemetry.install_global = false;

    let spans = InMemorySpanExporter::default();
    let factory = InMemoryProviders {
        spans: spans.clone(),
    };
    let telemetry = setup_with(&config.telemetry, TelemetryEnv::Dev, &factory).unwrap();
    let state = AppState::new(
        DiceMetrics::new(&telemetry.meter()),
        telemetry.http_telemetry(),
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, state);
    let server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestService {
        addr,
        spans,
        telemetry,
        shutdown,
        server,
    }
}
