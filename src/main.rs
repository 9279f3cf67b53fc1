use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fractic_iap_relay::{
    config::RelayConfig, listeners::LogListener, memory_store::MemorySubscriptionStore,
    server::Server, util::ReceiptUtil,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = RelayConfig::parse();

    let default_filter = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    config.validate()?;

    let receipts = Arc::new(ReceiptUtil::new(
        &config.shared_secret,
        config.verify_endpoints(),
    )?);
    let store = Arc::new(MemorySubscriptionStore::new(config.expiry_window()?));

    let mut server = Server::new(receipts, store.clone(), store.clone())
        .with_updater(store)
        .with_config(&config);
    server.add_listener(Arc::new(LogListener), true);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "fractic-iap-relay starting");

    server.serve(listener, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
