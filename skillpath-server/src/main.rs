use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, anyhow};
use axum::http::HeaderValue;
use clap::{Args as ClapArgs, Parser, Subcommand};
use skillpath_config::{Config, ConfigLoad, ConfigLoader};
use skillpath_core::{
    AppUnitOfWork,
    database::{
        InMemoryCatalog, InMemoryTrackingStore, PoolSettings, PostgresDatabase,
    },
    domain::WatchPolicy,
};
use skillpath_server::{AppState, routes::create_api_router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "skillpath-server")]
#[command(about = "Enrollment, watch progress and course completion tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Explicit TOML config file
    #[arg(long, env = "SKILLPATH_CONFIG")]
    config: Option<PathBuf>,

    /// Run on in-process storage with a seeded demo course instead of
    /// PostgreSQL. State is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&cli.serve).await?;
                return Ok(());
            }
        }
    }

    run_server(cli.serve).await
}

async fn run_db_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let pg = connect_postgres(&config).await?;
    pg.initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(())
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(config)
}

async fn connect_postgres(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let url = config.database.primary_url.as_deref().ok_or_else(|| {
        anyhow!(
            "DATABASE_URL is not set; configure a PostgreSQL URL or start with --in-memory"
        )
    })?;

    let settings = PoolSettings {
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout: config.database.acquire_timeout(),
    };

    PostgresDatabase::connect(url, settings)
        .await
        .context("failed to connect to PostgreSQL")
}

/// Demo course so the in-memory server has something to enroll in.
async fn seed_demo_catalog() -> anyhow::Result<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    let course_id = catalog.add_course("Getting Started").await;
    for (module_order, videos) in [(0, 3), (1, 2)] {
        let module_id = catalog
            .add_module(course_id, module_order)
            .await
            .context("failed to seed demo module")?;
        for video_order in 0..videos {
            let video_id = catalog
                .add_video(module_id, video_order)
                .await
                .context("failed to seed demo video")?;
            info!(%course_id, %video_id, module_order, video_order, "seeded demo video");
        }
    }
    info!(%course_id, "seeded demo course");
    Ok(catalog)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    // Permissive in dev, allow-list otherwise
    if config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter(|origin| origin.trim() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();
    let allow_origin = if origins.is_empty() || config.cors.is_wildcard_included()
    {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;

    let policy = WatchPolicy::new(config.tracking.watched_threshold)
        .context("invalid watched threshold")?;

    let in_memory = args.in_memory
        || (config.dev_mode && config.database.primary_url.is_none());

    let (unit_of_work, postgres) = if in_memory {
        if !args.in_memory {
            warn!("no database configured in dev mode; using in-memory storage");
        }
        let store = InMemoryTrackingStore::new();
        let catalog = seed_demo_catalog().await?;
        (AppUnitOfWork::in_memory(&store, catalog), None)
    } else {
        let postgres = Arc::new(connect_postgres(&config).await?);
        postgres
            .initialize_schema()
            .await
            .context("database migration failed")?;
        let unit_of_work = AppUnitOfWork::from_postgres(&postgres)
            .map_err(|err| anyhow!("failed to build unit of work: {err}"))?;
        (unit_of_work, Some(postgres))
    };

    let config = Arc::new(config);
    let state = AppState::new(&unit_of_work, policy, config.clone(), postgres);

    let router = create_api_router()
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server.bind_address();
    info!(
        "Starting Skillpath server on {}:{} (watched threshold {}%)",
        config.server.host,
        config.server.port,
        policy.watched_threshold()
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
