//! Validator leaderboard backend.
//!
//! Serves ranked leaderboards for three competition iterations. Each
//! iteration's board is recomputed at most once a minute, so upstream
//! reporting endpoints see bounded load no matter how hot the frontend runs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_backend::{
    api::{router, AppState},
    leaderboard::cache::Leaderboard,
    leaderboard::metrics::{It1Metric, It2Metric, It3Metric},
    leaderboard::source::{
        DisabledSource, MetricSource, RawIt1Record, RawIt2Record, RawIt3Record, RemoteSource,
        SnapshotSource,
    },
    models::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    info!("🚀 Leaderboard backend starting");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    // Iteration 1 results are final; the snapshot is parsed once at boot.
    let it1_source: SnapshotSource<It1Metric> =
        SnapshotSource::from_file::<RawIt1Record>(Path::new(&config.it1_snapshot_path))
            .with_context(|| format!("load it1 snapshot from {}", config.it1_snapshot_path))?;

    let it2_source: Box<dyn MetricSource<It2Metric>> = match &config.it2_url {
        Some(url) => Box::new(RemoteSource::<RawIt2Record, It2Metric>::new(
            http_client.clone(),
            url.clone(),
        )),
        None => {
            warn!("⚠️  LEADERBOARD_IT2_URL not set - iteration 2 disabled");
            Box::new(DisabledSource::new("LEADERBOARD_IT2_URL not set"))
        }
    };

    let it3_source: Box<dyn MetricSource<It3Metric>> = match &config.it3_url {
        Some(url) => Box::new(RemoteSource::<RawIt3Record, It3Metric>::new(
            http_client.clone(),
            url.clone(),
        )),
        None => {
            warn!("⚠️  LEADERBOARD_IT3_URL not set - iteration 3 disabled");
            Box::new(DisabledSource::new("LEADERBOARD_IT3_URL not set"))
        }
    };

    let state = AppState {
        it1: Arc::new(Leaderboard::new("it1", Box::new(it1_source))),
        it2: Arc::new(Leaderboard::new("it2", it2_source)),
        it3: Arc::new(Leaderboard::new("it3", it3_source)),
    };

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaderboard_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
