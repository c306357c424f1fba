//! OpenTelemetry pipeline bootstrap.
//!
//! Builds, in order:
//! - W3C propagator (Trace Context + Baggage)
//! - Resource (`service.name`, `service.version`, `deployment.environment.name`)
//! - Tracer provider, then meter provider
//!
//! Every provider registers its shutdown in a [`ReleaseGroup`] as soon as it
//! exists. When a later step fails, everything acquired so far is released
//! before the error is returned.

use std::fmt;
use std::sync::Arc;

use opentelemetry::global;
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use thiserror::Error;

use crate::config::TelemetryConfig;
use crate::lifecycle::release::{BoxError, ReleaseError, ReleaseGroup};
use crate::observability::env::TelemetryEnv;
use crate::observability::metrics::SCOPE;
use crate::observability::providers::{ConsoleProviders, OtlpProviders, ProviderFactory};
use crate::observability::tracing::HttpTelemetry;

const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment.name";

/// Telemetry signal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Traces,
    Metrics,
}

impl Signal {
    /// OTLP/HTTP path for this signal.
    pub fn path(&self) -> &'static str {
        match self {
            Signal::Traces => "v1/traces",
            Signal::Metrics => "v1/metrics",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Traces => f.write_str("trace"),
            Signal::Metrics => f.write_str("metric"),
        }
    }
}

/// Errors from building or tearing down the telemetry pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build {signal} exporter: {source}")]
    Exporter {
        signal: Signal,
        #[source]
        source: BoxError,
    },

    #[error("telemetry environment is \"prod\" but no OTLP endpoint is configured")]
    MissingEndpoint,

    /// Setup failed and releasing the already-built providers failed too.
    #[error("{cause}; cleanup after failed setup also failed: {cleanup}")]
    PartialSetup {
        cause: Box<TelemetryError>,
        cleanup: ReleaseError,
    },

    #[error("telemetry shutdown failed: {0}")]
    Shutdown(#[from] ReleaseError),
}

impl TelemetryError {
    pub fn exporter<E>(signal: Signal, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        TelemetryError::Exporter {
            signal,
            source: source.into(),
        }
    }
}

/// A running telemetry pipeline.
///
/// Call [`Telemetry::shutdown`] before exit to flush pending spans and
/// metrics. Dropping without it still releases the providers, but errors are
/// only logged.
pub struct Telemetry {
    env: TelemetryEnv,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    propagator: Arc<TextMapCompositePropagator>,
    releases: ReleaseGroup,
}

impl Telemetry {
    pub fn env(&self) -> TelemetryEnv {
        self.env
    }

    pub fn tracer(&self) -> SdkTracer {
        self.tracer_provider.tracer(SCOPE)
    }

    pub fn meter(&self) -> Meter {
        self.meter_provider.meter(SCOPE)
    }

    pub fn propagator(&self) -> Arc<TextMapCompositePropagator> {
        self.propagator.clone()
    }

    /// State for the HTTP instrumentation middleware.
    pub fn http_telemetry(&self) -> HttpTelemetry {
        HttpTelemetry::new(self.tracer(), self.propagator())
    }

    /// Register the providers and a propagator as the process-wide globals,
    /// for libraries that only know the global API.
    pub fn install_global(&self) {
        global::set_text_map_propagator(new_propagator());
        global::set_tracer_provider(self.tracer_provider.clone());
        global::set_meter_provider(self.meter_provider.clone());
    }

    /// Flush and shut down every provider, joining their errors.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    pub fn shutdown(&mut self) -> Result<(), TelemetryError> {
        self.releases.release_all()?;
        Ok(())
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("env", &self.env)
            .field("releases", &self.releases)
            .finish_non_exhaustive()
    }
}

/// Bootstrap the pipeline for the configured environment.
pub fn setup_telemetry(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    let env = config.env();
    match env {
        TelemetryEnv::Dev => setup_with(config, env, &ConsoleProviders::new(config)),
        TelemetryEnv::Prod => setup_with(config, env, &OtlpProviders::new(config)?),
    }
}

/// Bootstrap the pipeline with a caller-supplied provider factory.
pub fn setup_with<F>(
    config: &TelemetryConfig,
    env: TelemetryEnv,
    factory: &F,
) -> Result<Telemetry, TelemetryError>
where
    F: ProviderFactory + ?Sized,
{
    let mut releases = ReleaseGroup::new();
    let propagator = Arc::new(new_propagator());
    let resource = build_resource(config, env);

    let tracer_provider = match factory.tracer_provider(resource.clone()) {
        Ok(provider) => provider,
        Err(e) => return Err(abort(e, &mut releases)),
    };
    let provider = tracer_provider.clone();
    releases.register("tracer provider", move || {
        provider.shutdown().map_err(Into::into)
    });

    let meter_provider = match factory.meter_provider(resource) {
        Ok(provider) => provider,
        Err(e) => return Err(abort(e, &mut releases)),
    };
    let provider = meter_provider.clone();
    releases.register("meter provider", move || {
        provider.shutdown().map_err(Into::into)
    });

    tracing::info!(
        env = %env,
        service.name = %config.service_name,
        "Telemetry pipeline ready"
    );

    Ok(Telemetry {
        env,
        tracer_provider,
        meter_provider,
        propagator,
        releases,
    })
}

/// Release whatever was acquired and fold a cleanup failure into `cause`.
fn abort(cause: TelemetryError, releases: &mut ReleaseGroup) -> TelemetryError {
    tracing::error!(error = %cause, "Telemetry setup failed, releasing acquired providers");
    match releases.release_all() {
        Ok(()) => cause,
        Err(cleanup) => TelemetryError::PartialSetup {
            cause: Box::new(cause),
            cleanup,
        },
    }
}

fn new_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

fn build_resource(config: &TelemetryConfig, env: TelemetryEnv) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new(DEPLOYMENT_ENVIRONMENT, env.as_str()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Hands out a real tracer provider but refuses to build a meter provider.
    #[derive(Default)]
    struct FailingMeter {
        handed_out: Mutex<Option<SdkTracerProvider>>,
    }

    impl ProviderFactory for FailingMeter {
        fn tracer_provider(&self, resource: Resource) -> Result<SdkTracerProvider, TelemetryError> {
            let provider = SdkTracerProvider::builder().with_resource(resource).build();
            *self.handed_out.lock().unwrap() = Some(provider.clone());
            Ok(provider)
        }

        fn meter_provider(&self, _resource: Resource) -> Result<SdkMeterProvider, TelemetryError> {
            Err(TelemetryError::exporter(
                Signal::Metrics,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "collector down"),
            ))
        }
    }

    #[test]
    fn meter_failure_releases_tracer_provider_once() {
        let factory = FailingMeter::default();

        let err = setup_with(&TelemetryConfig::default(), TelemetryEnv::Dev, &factory).unwrap_err();

        // A second shutdown inside setup would have surfaced as PartialSetup.
        assert!(matches!(
            err,
            TelemetryError::Exporter { signal: Signal::Metrics, .. }
        ));
        assert!(err.to_string().contains("collector down"));

        let provider = factory.handed_out.lock().unwrap().take().unwrap();
        assert!(provider.shutdown().is_err(), "provider should already be shut down");
    }

    #[test]
    fn cleanup_failure_is_joined_with_cause() {
        let factory = FailingMeter::default();
        // Shut the provider down behind setup's back so its release fails.
        struct Sabotaged<'a>(&'a FailingMeter);
        impl ProviderFactory for Sabotaged<'_> {
            fn tracer_provider(
                &self,
                resource: Resource,
            ) -> Result<SdkTracerProvider, TelemetryError> {
                let provider = self.0.tracer_provider(resource)?;
                let _ = provider.shutdown();
                Ok(provider)
            }

            fn meter_provider(
                &self,
                resource: Resource,
            ) -> Result<SdkMeterProvider, TelemetryError> {
                self.0.meter_provider(resource)
            }
        }

        let err = setup_with(
            &TelemetryConfig::default(),
            TelemetryEnv::Dev,
            &Sabotaged(&factory),
        )
        .unwrap_err();

        match err {
            TelemetryError::PartialSetup { cause, cleanup } => {
                assert!(matches!(*cause, TelemetryError::Exporter { .. }));
                assert_eq!(cleanup.failures().len(), 1);
                assert_eq!(cleanup.failures()[0].name, "tracer provider");
            }
            other => panic!("expected PartialSetup, got {other:?}"),
        }
    }

    #[test]
    fn dev_pipeline_shuts_down_once() {
        let mut telemetry = setup_telemetry(&TelemetryConfig::default()).unwrap();
        assert_eq!(telemetry.env(), TelemetryEnv::Dev);

        assert!(telemetry.shutdown().is_ok());
        assert!(telemetry.shutdown().is_ok());
    }

    #[test]
    fn prod_pipeline_without_endpoint_fails_fast() {
        let config = TelemetryConfig {
            environment: "prod".into(),
            ..TelemetryConfig::default()
        };
        assert!(matches!(
            setup_telemetry(&config),
            Err(TelemetryError::MissingEndpoint)
        ));
    }

    #[test]
    fn prod_pipeline_builds_otlp_exporters() {
        let config = TelemetryConfig {
            environment: "prod".into(),
            otlp_endpoint: Some("http://127.0.0.1:4318".into()),
            ..TelemetryConfig::default()
        };

        let mut telemetry = setup_telemetry(&config).unwrap();
        assert_eq!(telemetry.env(), TelemetryEnv::Prod);
        // Nothing listens on the collector port; only construction is under test.
        let _ = telemetry.shutdown();
    }

    #[test]
    fn signal_display_and_paths() {
        assert_eq!(Signal::Traces.to_string(), "trace");
        assert_eq!(Signal::Metrics.path(), "v1/metrics");
    }
}
