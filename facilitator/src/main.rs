//! Standalone x402 facilitator server for the Vara blockchain.
//!
//! Reads its configuration from the environment (and `.env` if present),
//! connects to the configured chain gateways lazily, and serves the
//! verify and settle endpoints until Ctrl-C or SIGTERM.

use std::sync::Arc;

use x402_chain_vara::V1VaraExactFacilitator;
use x402_chain_vara::chain::VaraChainProvider;
use x402_vara_facilitator::{AppState, FacilitatorConfig, Limits, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = FacilitatorConfig::from_env()?;

    // LOG_LEVEL is used if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    for chain in &config.chains {
        tracing::info!(
            network = %chain.network,
            chain_id = %chain.network.as_chain_id(),
            gateway = %chain.gateway_url,
            timeout_secs = chain.timeout.as_secs(),
            "Vara network enabled"
        );
    }

    let provider = VaraChainProvider::from_configs(config.chains.clone());
    let facilitator = V1VaraExactFacilitator::new(Arc::new(provider));
    let state = Arc::new(AppState::new(facilitator));
    let app = router(state, Limits::from(&config));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Vara facilitator listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Waits for Ctrl-C or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
