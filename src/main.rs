//! Application entry point: logging setup plus server start.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oneclick_server::server;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Structured logging: env-filtered, compact console output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info")
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    server::start().await;
}
