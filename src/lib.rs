pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use db::{Store, UserConflict};
use entities::users::Role;
use models::user::NewUser;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config, prometheus_handle).await
        }
        Commands::Seed => cmd_seed(&config).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => cmd_create_admin(&config, username, email, password).await,
        Commands::InitConfig => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched");
            }
            Ok(())
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
        let (layer, task) = builder
            .extra_field("version", env!("CARGO_PKG_VERSION"))?
            .build_url(url)?;

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

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "catalog-api v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let limiter = Arc::clone(api_state.rate_limiter());
    let purge_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            limiter.purge_expired();
        }
    });

    let app = api::router(api_state).await;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://0.0.0.0:{}", port);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        error!("Web server error: {}", e);
    }

    purge_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let summary = services::seed::seed_sample_data(&store, &config.security).await?;

    println!(
        "✓ Seeded {} users and {} products",
        summary.users_created, summary.products_created
    );
    Ok(())
}

async fn cmd_create_admin(
    config: &Config,
    username: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let fields = serde_json::json!({
        "username": username,
        "email": email,
        "password": password,
    });
    let errors = fields
        .as_object()
        .map(validation::validate_registration)
        .unwrap_or_default();
    if !errors.is_empty() {
        anyhow::bail!("Invalid admin account: {}", errors.join("; "));
    }

    let store = open_store(config).await?;
    let users = store.users();

    match users
        .find_conflict(Some(username.as_str()), Some(email.as_str()), None)
        .await?
    {
        Some(UserConflict::Username) => anyhow::bail!("Username already exists"),
        Some(UserConflict::Email) => anyhow::bail!("Email already exists"),
        None => {}
    }

    let user = users
        .create(
            NewUser {
                username,
                email,
                password: Some(password),
                role: Role::Admin,
                is_active: true,
            },
            &config.security,
        )
        .await?;

    info!(user_id = user.id, "Admin account created");
    println!("✓ Admin '{}' created (id {})", user.username, user.id);
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

/// Builds the full application over an existing store. Used by the
/// integration tests, which bring their own database.
pub async fn build_app(config: Config, store: Store) -> anyhow::Result<axum::Router> {
    let shared = Arc::new(SharedState::with_store(config, store).await?);
    let state = api::create_app_state(shared, None);
    Ok(api::router(state).await)
}
