//! Headless client runner
//!
//! Wires configuration into a manager and a logging consumer, then holds
//! the connection open until Ctrl-C.

use crate::auth::StaticAuth;
use crate::connection::{ConnectionManager, ManagerConfig};
use crate::consumer::Consumer;
use crate::resolver::{Deployment, UriResolver};
use crate::subscription::{Callbacks, Subscriber};
use std::sync::Arc;
use tether_common::{AppResult, ClientConfig};
use tether_core::AuthProvider;

/// Subscriber that prints every envelope to stdout and logs the rest
fn logging_subscriber() -> Arc<dyn Subscriber> {
    Arc::new(
        Callbacks::new()
            .with_connect(|| tracing::info!("Connected"))
            .with_message(|message| match message.to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, kind = %message.kind, "Failed to print envelope"),
            })
            .with_disconnect(|reason| {
                tracing::info!(reason = %reason, close_code = ?reason.close_code(), "Disconnected");
            })
            .with_error(|error| tracing::warn!(code = error.code(), error = %error, "Connection error")),
    )
}

/// Run the client until Ctrl-C
///
/// # Errors
/// Returns an error if the endpoint configuration is unusable or the
/// signal handler cannot be installed
pub async fn run(config: ClientConfig) -> AppResult<()> {
    let deployment = Deployment::from_config(&config.endpoint)?;
    let auth = Arc::new(StaticAuth::from_credentials(&config.credentials));

    if !auth.snapshot().has_identity() {
        tracing::warn!("No credentials configured (TETHER_IDENTITY, TETHER_TOKEN); nothing to do");
        return Ok(());
    }

    let deployment_name = deployment.to_string();
    let manager = ConnectionManager::websocket(
        ManagerConfig::from(&config),
        UriResolver::new(deployment, auth.clone()),
    );

    let tuning = manager.config();
    tracing::info!(
        deployment = %deployment_name,
        connect_timeout_ms = tuning.connect_timeout.as_millis() as u64,
        heartbeat_interval_ms = tuning.heartbeat_interval.as_millis() as u64,
        max_attempts = tuning.backoff.max_attempts,
        "Starting client"
    );

    let consumer = Consumer::mount(&manager, auth, logging_subscriber());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    consumer.disconnect();
    consumer.unmount();
    Ok(())
}
