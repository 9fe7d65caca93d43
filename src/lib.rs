pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    init_tracing(&config)?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let prometheus_handle = init_metrics(&config)?;
            run_server(config, prometheus_handle).await
        }

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created with a new session secret.");
                println!("  Edit config.toml and run `guildhall serve`.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Some(Commands::GrantRole { email, role }) => {
            let state = SharedState::new(config).await?;
            cli::cmd_grant_role(&state, &email, &role).await
        }

        Some(Commands::RevokeRole { email, role }) => {
            let state = SharedState::new(config).await?;
            cli::cmd_revoke_role(&state, &email, &role).await
        }

        Some(Commands::SetMemberType { email, member_type }) => {
            let state = SharedState::new(config).await?;
            cli::cmd_set_member_type(&state, &email, &member_type).await
        }

        Some(Commands::Members { member_type, page }) => {
            let state = SharedState::new(config).await?;
            cli::cmd_list_members(&state, member_type.as_deref(), page).await
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn init_metrics(
    config: &Config,
) -> anyhow::Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Guildhall v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let app = api::router(api::create_app_state(shared, prometheus_handle));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
