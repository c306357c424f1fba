//! Tracer and meter provider construction for each telemetry environment.

use std::time::Duration;

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use crate::config::TelemetryConfig;
use crate::observability::pipeline::{Signal, TelemetryError};

/// Builds the providers a telemetry pipeline is assembled from.
///
/// Each method is called at most once per setup, tracer first.
pub trait ProviderFactory {
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, TelemetryError>;

    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, TelemetryError>;
}

/// Dev wiring: spans and metrics printed to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleProviders {
    batch_delay: Duration,
    metric_interval: Duration,
}

impl ConsoleProviders {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            batch_delay: Duration::from_millis(config.trace_batch_delay_ms),
            metric_interval: Duration::from_secs(config.metric_interval_secs),
        }
    }
}

impl ProviderFactory for ConsoleProviders {
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, TelemetryError> {
        let exporter = opentelemetry_stdout::SpanExporter::default();
        Ok(SdkTracerProvider::builder()
            .with_span_processor(batch_processor(exporter, self.batch_delay))
            .with_resource(resource)
            .build())
    }

    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, TelemetryError> {
        let exporter = opentelemetry_stdout::MetricExporter::default();
        let reader = PeriodicReader::builder(exporter)
            .with_interval(self.metric_interval)
            .build();
        Ok(SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build())
    }
}

/// Prod wiring: OTLP over HTTP to a collector.
#[derive(Debug, Clone)]
pub struct OtlpProviders {
    traces_url: String,
    metrics_url: String,
    batch_delay: Duration,
    metric_interval: Duration,
    export_timeout: Duration,
}

impl OtlpProviders {
    /// Fails with [`TelemetryError::MissingEndpoint`] when no collector is configured.
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let base = config
            .otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(TelemetryError::MissingEndpoint)?;

        Ok(Self {
            traces_url: signal_url(base, Signal::Traces),
            metrics_url: signal_url(base, Signal::Metrics),
            batch_delay: Duration::from_millis(config.trace_batch_delay_ms),
            metric_interval: Duration::from_secs(config.metric_interval_secs),
            export_timeout: Duration::from_secs(config.export_timeout_secs),
        })
    }

    pub fn traces_url(&self) -> &str {
        &self.traces_url
    }

    pub fn metrics_url(&self) -> &str {
        &self.metrics_url
    }
}

impl ProviderFactory for OtlpProviders {
    fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, TelemetryError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(self.traces_url.clone())
            .with_timeout(self.export_timeout)
            .build()
            .map_err(|e| TelemetryError::exporter(Signal::Traces, e))?;

        Ok(SdkTracerProvider::builder()
            .with_span_processor(batch_processor(exporter, self.batch_delay))
            .with_resource(resource)
            .build())
    }

    fn meter_provider(&self, resource: Resource) -> Result<SdkMeterProvider, TelemetryError> {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_http()
            .with_endpoint(self.metrics_url.clone())
            .with_timeout(self.export_timeout)
            .build()
            .map_err(|e| TelemetryError::exporter(Signal::Metrics, e))?;

        let reader = PeriodicReader::builder(exporter)
            .with_interval(self.metric_interval)
            .build();
        Ok(SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build())
    }
}

fn batch_processor<E>(exporter: E, delay: Duration) -> BatchSpanProcessor
where
    E: opentelemetry_sdk::trace::SpanExporter + 'static,
{
    BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_scheduled_delay(delay)
                .build(),
        )
        .build()
}

/// `<base>/v1/traces` or `<base>/v1/metrics`, tolerating a trailing slash on `base`.
fn signal_url(base: &str, signal: Signal) -> String {
    format!("{}/{}", base.trim_end_matches('/'), signal.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prod_config(endpoint: Option<&str>) -> TelemetryConfig {
        TelemetryConfig {
            environment: "prod".into(),
            otlp_endpoint: endpoint.map(Into::into),
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn signal_urls_are_derived_from_base() {
        let providers = OtlpProviders::new(&prod_config(Some("https://collector:4318/"))).unwrap();
        assert_eq!(providers.traces_url(), "https://collector:4318/v1/traces");
        assert_eq!(providers.metrics_url(), "https://collector:4318/v1/metrics");
    }

    #[test]
    fn missing_or_blank_endpoint_is_rejected() {
        assert!(matches!(
            OtlpProviders::new(&prod_config(None)),
            Err(TelemetryError::MissingEndpoint)
        ));
        assert!(matches!(
            OtlpProviders::new(&prod_config(Some(" "))),
            Err(TelemetryError::MissingEndpoint)
        ));
    }

    #[test]
    fn console_providers_build_and_shut_down() {
        let factory = ConsoleProviders::new(&TelemetryConfig::default());
        let resource = Resource::builder().build();

        let tracer_provider = factory.tracer_provider(resource.clone()).unwrap();
        let meter_provider = factory.meter_provider(resource).unwrap();

        assert!(tracer_provider.shutdown().is_ok());
        assert!(meter_provider.shutdown().is_ok());
    }
}
