//! Tether client entry point
//!
//! Run with:
//! ```bash
//! TETHER_IDENTITY=user-1 TETHER_TOKEN=a.b.c cargo run -p tether-client
//! ```
//!
//! Configuration is loaded from environment variables.

use tether_common::{try_init_tracing, try_init_tracing_with_config, ClientConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration first; it selects the tracing profile
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            if let Err(e) = try_init_tracing() {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        "Configuration loaded"
    );

    if let Err(e) = tether_client::run(config).await {
        error!(error = %e, code = e.error_code(), "Client failed");
        std::process::exit(1);
    }
}
