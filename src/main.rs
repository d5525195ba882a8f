use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{fmt, EnvFilter};

use pizza_metrics::config::AppConfig;
use pizza_metrics::sampler::HostSampler;
use pizza_metrics::transport::HttpTransport;
use pizza_metrics::{server, AppState, Aggregator, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal startup error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    // ── 1. Configuration ─────────────────────────────────────────
    let cfg = AppConfig::load().context("load configuration")?;
    let listen = cfg.listen_addr().context("parse listen address")?;

    // ── 2. Telemetry wiring ──────────────────────────────────────
    let transport =
        HttpTransport::from_config(&cfg.metrics).context("build metrics HTTP client")?;
    let aggregator = Arc::new(Aggregator::new(
        cfg.metrics.source.clone(),
        Arc::new(HostSampler::new()),
        Arc::new(transport),
    ));
    let scheduler = Scheduler::spawn(Arc::clone(&aggregator), cfg.metrics.flush_interval());

    tracing::info!(
        endpoint = %cfg.metrics.url,
        source = %cfg.metrics.source,
        flush_interval_ms = cfg.metrics.flush_interval_ms,
        "metrics reporting enabled",
    );

    // ── 3. Router ────────────────────────────────────────────────
    let state = Arc::new(AppState {
        metrics: aggregator,
    });
    let app = server::create_router(state, Router::new());

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("bind {listen}"))?;
    tracing::info!(%listen, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    // ── 5. Drain ─────────────────────────────────────────────────
    tracing::info!("shutting down; flushing pending metrics");
    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
