use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drugcast::catalog::{SeriesCatalog, SeriesConfig};
use drugcast::config::AppConfig;
use drugcast::data::SalesFrame;
use drugcast::handlers::{api_router, dashboard_router, AppState};
use drugcast::ml::forecast::{self, TargetMode};
use drugcast::store::ModelStore;
use drugcast::{demo, jobs};

#[derive(Parser)]
#[command(name = "drugcast", version, about = "Weekly drug-sales forecasting")]
struct Cli {
    /// Configuration file name, without extension.
    #[arg(long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the forecast API and the dashboard backend.
    Serve,
    /// Fit and persist a model for every catalog series.
    Train {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Forecast the evaluation year of the dataset and report accuracy.
    Evaluate {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Forecast a CSV (or a generated sample) against the persisted models.
    Demo {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write the sample data used to this CSV path.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the prediction map to this JSON path.
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "drugcast=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    tracing::info!("Configuration loaded");

    let catalog = SeriesCatalog::reference();

    match cli.command {
        Command::Serve => serve(config, catalog).await,
        Command::Train { data } => train(&config, &catalog, data),
        Command::Evaluate { data } => evaluate(&config, &catalog, data).await,
        Command::Demo { input, out, json, seed } => {
            run_demo(&config, &catalog, input, out, json, seed).await
        }
    }
}

async fn serve(config: AppConfig, catalog: SeriesCatalog) -> anyhow::Result<()> {
    let state = AppState::new(&config, catalog);
    let models = state.store.list_available()?;
    tracing::info!(models = models.len(), dir = %state.store.dir().display(), "Model store ready");

    let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.api_port).parse()?;
    let dashboard_addr: SocketAddr =
        format!("{}:{}", config.server.host, config.server.dashboard_port).parse()?;

    let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
    let dashboard_listener = tokio::net::TcpListener::bind(dashboard_addr).await?;
    tracing::info!("Starting forecast API on {api_addr}");
    tracing::info!("Starting dashboard backend on {dashboard_addr}");

    let api = axum::serve(api_listener, api_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal());
    let dashboard = axum::serve(dashboard_listener, dashboard_router(state))
        .with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async { api.await.context("forecast API server failed") },
        async { dashboard.await.context("dashboard server failed") },
    )?;

    tracing::info!("Servers shut down gracefully");
    Ok(())
}

fn train(config: &AppConfig, catalog: &SeriesCatalog, data: Option<PathBuf>) -> anyhow::Result<()> {
    let path = data.unwrap_or_else(|| PathBuf::from(&config.data.path));
    let frame = SalesFrame::from_path(&path)
        .with_context(|| format!("failed to load dataset {}", path.display()))?;
    let store = ModelStore::from_config(&config.store);

    let report = jobs::run_training(catalog, &frame.observations(), config.data.train_cutoff, &store);

    println!("Trained {} model(s) into {}", report.trained.len(), store.dir().display());
    for (series_id, reason) in &report.failed {
        println!("  {series_id}: FAILED ({reason})");
    }
    Ok(())
}

async fn evaluate(config: &AppConfig, catalog: &SeriesCatalog, data: Option<PathBuf>) -> anyhow::Result<()> {
    let path = data.unwrap_or_else(|| PathBuf::from(&config.data.path));
    let frame = SalesFrame::from_path(&path)
        .with_context(|| format!("failed to load dataset {}", path.display()))?;
    let store = Arc::new(ModelStore::from_config(&config.store));

    let outcome = forecast::predict(
        store,
        catalog.all_series(),
        Arc::new(frame.observations()),
        TargetMode::Evaluation { year: config.data.evaluation_year },
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&outcome.forecasts)?);
    println!();
    println!("{:<8} {:>6} {:>14} {:>10}", "series", "points", "mse", "mape");
    for (series_id, result) in &outcome.forecasts {
        match (result.mse, result.mape) {
            (Some(mse), Some(mape)) => println!(
                "{:<8} {:>6} {:>14.2} {:>10.4}",
                series_id,
                result.predictions.len(),
                mse,
                mape
            ),
            _ => println!(
                "{:<8} {:>6} {:>14} {:>10}",
                series_id,
                result.predictions.len(),
                "-",
                result.note.as_deref().unwrap_or("-")
            ),
        }
    }
    for (series_id, e) in &outcome.skipped {
        println!("{series_id:<8} skipped: {e}");
    }
    Ok(())
}

async fn run_demo(
    config: &AppConfig,
    catalog: &SeriesCatalog,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    json: Option<PathBuf>,
    seed: u64,
) -> anyhow::Result<()> {
    let frame = match &input {
        Some(path) => SalesFrame::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => demo::synthetic_sample(seed)?,
    };

    if let Some(path) = &out {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        frame.write_csv(file)?;
        println!("Sample data written to {}", path.display());
    }

    let (available, missing): (Vec<SeriesConfig>, Vec<SeriesConfig>) = catalog
        .all_series()
        .iter()
        .cloned()
        .partition(|c| frame.has_series(&c.id));
    if available.is_empty() {
        anyhow::bail!("no catalog series found in the input data");
    }

    let store = Arc::new(ModelStore::from_config(&config.store));
    let outcome = forecast::predict(store, &available, Arc::new(frame.observations()), TargetMode::Observed).await;

    println!("Rows: {}", frame.len());
    if let Some((start, end)) = frame.date_range() {
        println!("Date range: {start} to {end}");
    }
    println!("{:<8} {:>6} {:>12} {:>12} {:>12}", "series", "points", "mean", "min", "max");
    for s in demo::summarize(&outcome.forecasts) {
        println!(
            "{:<8} {:>6} {:>12.2} {:>12.2} {:>12.2}",
            s.series_id, s.points, s.mean, s.min, s.max
        );
    }
    if !missing.is_empty() {
        let ids: Vec<&str> = missing.iter().map(|c| c.id.as_str()).collect();
        println!("Missing series: {}", ids.join(", "));
    }
    for (series_id, e) in &outcome.skipped {
        println!("{series_id:<8} skipped: {e}");
    }

    if let Some(path) = &json {
        std::fs::write(path, serde_json::to_string_pretty(&outcome.forecasts)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Predictions written to {}", path.display());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
