//! Waypost -- geolocation check-in service backed by object storage.
//!
//! Each inbound request is handled independently with no shared in-process
//! mutable state; the backing object store is the only state that outlives
//! a request. SIGTERM/SIGINT stop accepting connections and let in-flight
//! requests drain.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

/// Command-line arguments for the Waypost server.
#[derive(Parser, Debug)]
#[command(
    name = "waypost",
    version,
    about = "Geolocation check-in service backed by object storage"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "waypost.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = waypost::config::load_config(&cli.config)?;

    // Initialize tracing / logging. RUST_LOG takes precedence over the
    // configured level.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    // Initialize Prometheus metrics recorder and register metric descriptions.
    waypost::metrics::init_metrics();
    waypost::metrics::describe_metrics();
    info!("Prometheus metrics initialized");

    // Initialize the object store based on config.
    let store: Arc<dyn waypost::storage::store::ObjectStore> =
        match config.storage.backend.as_str() {
            "aws" => {
                let aws_config = config.storage.aws.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "storage.backend is 'aws' but storage.aws config section is missing"
                    )
                })?;
                let store = waypost::storage::aws::AwsStore::new(
                    aws_config.bucket.clone(),
                    aws_config.region.clone(),
                    aws_config.prefix.clone(),
                    (!aws_config.endpoint_url.is_empty())
                        .then(|| aws_config.endpoint_url.clone()),
                    aws_config.use_path_style,
                    (!aws_config.access_key_id.is_empty())
                        .then(|| aws_config.access_key_id.clone()),
                    (!aws_config.secret_access_key.is_empty())
                        .then(|| aws_config.secret_access_key.clone()),
                )
                .await?;
                info!(
                    "AWS object store initialized: bucket={} region={} prefix='{}'",
                    aws_config.bucket, aws_config.region, aws_config.prefix
                );
                Arc::new(store)
            }
            _ => {
                let versioned = config.storage.memory.versioned;
                info!("Memory object store initialized (versioned={})", versioned);
                Arc::new(waypost::storage::memory::MemoryStore::new(versioned))
            }
        };

    // Build AppState.
    let state = Arc::new(waypost::AppState {
        config: config.clone(),
        store,
    });

    let app = waypost::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Waypost listening on {}", bind_addr);

    // Graceful shutdown: on SIGTERM/SIGINT, stop accepting new connections
    // and wait for in-flight requests to complete.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waypost shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
