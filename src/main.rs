//! Roll-a-die HTTP service with OpenTelemetry tracing and metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /rolldice ──▶ request id ──▶ otel span ──▶ roll_dice ──▶ "<1-6>\n"
//!     GET /liveness ──▶ request id ──▶ otel span ──▶ liveness  ──▶ "OK"
//!                                         │              │
//!                                         ▼              ▼
//!                                  tracer provider  meter provider
//!                                         │              │
//!                          dev: stdout ◀──┴──────────────┴──▶ prod: OTLP/HTTP collector
//! ```
//!
//! Telemetry is built and shut down outside the Tokio runtime: the exporters
//! run their own threads and use blocking HTTP clients.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rolldice::config::{load_config, Overrides};
use rolldice::http::HttpServer;
use rolldice::lifecycle::{bootstrap, Shutdown, StartupError};
use rolldice::observability::logging::init_logging;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "rolldice", version)]
#[command(about = "Roll-a-die HTTP service instrumented with OpenTelemetry", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Telemetry environment ("dev" or "prod"); overrides config and ROLLDICE_ENV.
    #[arg(short, long)]
    env: Option<String>,

    /// Listener bind address; overrides config and ROLLDICE_BIND_ADDRESS.
    #[arg(short, long)]
    bind: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let overrides = Overrides {
        environment: cli.env,
        bind_address: cli.bind,
    };
    let config = load_config(cli.config.as_deref(), overrides)?;

    init_logging(&config.logging)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let mut service = bootstrap(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(async {
        let address = config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;

        let shutdown = Shutdown::new();
        shutdown.trigger_on_signal();

        let server = HttpServer::new(&config, service.state.clone());
        server.run(listener, shutdown.subscribe()).await?;
        Ok::<_, Box<dyn Error>>(())
    });
    drop(runtime);

    let released = service.telemetry.shutdown();
    if let Err(e) = &released {
        tracing::error!(error = %e, "Telemetry shutdown failed");
    }

    served?;
    released?;
    tracing::info!("Shutdown complete");
    Ok(())
}
