mod cli;
mod report;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use logomark::LogoPipeline;
use logomark::http::{AppState, router};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Cli;
use crate::report::{report_startup_error, warn_missing_credentials};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    warn_missing_credentials(&cli);

    let pipeline = LogoPipeline::new(
        Arc::new(cli.remove_bg.client()),
        Arc::new(cli.vectorizer.client()),
    )
    .with_brand_color(cli.brand_color)
    .with_default_mode(cli.default_mode);
    let state = AppState::new(pipeline, cli.key_report()).with_body_limit(cli.max_body_bytes);

    let listener = match tokio::net::TcpListener::bind(cli.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            report_startup_error(cli.bind, &err);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        bind = %cli.bind,
        default_mode = %cli.default_mode,
        brand_color = %cli.brand_color,
        "logomark listening"
    );

    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
        }
    });
    if let Err(err) = server.await {
        report_startup_error(cli.bind, &err);
        return ExitCode::FAILURE;
    }
    tracing::info!("shut down");
    ExitCode::SUCCESS
}
