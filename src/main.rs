use anyhow::Context;
use disaster_response::{
    analytics::DatasetOverview,
    api::{build_router, AppState},
    config::Config,
    ml::Pipeline,
    state::{DatasetStore, SqliteStore},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    telemetry::init_tracing(&config.observability)?;
    tracing::info!("Starting disaster-response v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        if let Err(e) = disaster_response::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("Prometheus metrics initialized");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    let store = SqliteStore::open_read_only(&config.data.database_path).with_context(|| {
        format!(
            "opening database {}",
            config.data.database_path.display()
        )
    })?;
    let table = store
        .load_table(&config.data.table_name)
        .with_context(|| format!("loading table {}", config.data.table_name))?;
    let overview = DatasetOverview::from_table(&table);
    tracing::info!(rows = overview.rows, "Dataset overview ready");

    let pipeline = Pipeline::load(&config.data.model_path)
        .with_context(|| format!("loading model {}", config.data.model_path.display()))?;
    tracing::info!(
        categories = pipeline.category_names().len(),
        "Model loaded"
    );

    let state = AppState::new(pipeline, overview)
        .with_prometheus(config.observability.prometheus_enabled);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
