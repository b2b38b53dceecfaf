//! kizbridge: local HTTP bridge to the Overkiz home-automation API.
//!
//! Authenticates a vendor session at startup, keeps the device cache
//! fresh in the background, and serves the REST front door until the
//! process receives SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use overkiz_core::Bridge;

use kizbridge::error::ServerError;
use kizbridge::routes;

#[derive(Debug, Parser)]
#[command(
    name = "kizbridge",
    version,
    about = "HTTP bridge to the Overkiz home-automation API"
)]
struct Cli {
    /// Full path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = overkiz_config::load(&cli.config)?;
    let addr = config.http.socket_addr()?;

    let bridge = Bridge::new(config.bridge_config()?);
    // Without a session there is nothing to serve; authentication
    // failures abort the process here.
    bridge.connect().await?;

    let app = routes::router(bridge.clone(), &config.http);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(bridge.cancellation_token()))
    .await?;

    bridge.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then propagate cancellation to the
/// background refresh task while the server drains connections.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
    cancel.cancel();
}
