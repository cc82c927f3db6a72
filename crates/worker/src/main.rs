use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use streamcal_core::config::Settings;
use streamcal_core::sweep::RetentionSweeper;
use streamcal_core::sync::Orchestrator;
use streamcal_db::PgStore;
use streamcal_youtube::YouTubeClient;

mod jobs;

#[derive(Clone)]
pub struct WorkerState {
    pub orchestrator: Arc<Orchestrator>,
    pub sweeper: Arc<RetentionSweeper>,
    pub retention_days: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let pool = streamcal_db::connect(&settings.database_url).await?;
    streamcal_db::MIGRATOR.run(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let platform = Arc::new(YouTubeClient::with_base_url(
        settings.youtube_api_key.clone(),
        settings.youtube_base_url.clone(),
    )?);

    let state = WorkerState {
        orchestrator: Arc::new(
            Orchestrator::new(store.clone(), store.clone(), store.clone(), platform)
                .with_pause(settings.channel_pause()),
        ),
        sweeper: Arc::new(RetentionSweeper::new(store.clone(), store.clone(), store)),
        retention_days: settings.retention_days,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweep_state = state.clone();
    let sweep = tokio::spawn(jobs::run_every(
        "retention-sweep",
        Duration::from_secs(settings.sweep_interval_secs),
        shutdown_rx.clone(),
        move || {
            let state = sweep_state.clone();
            async move { jobs::sweep::run_sweep(&state).await }
        },
    ));

    let live_state = state.clone();
    let live_sync = tokio::spawn(jobs::run_every(
        "live-sync",
        Duration::from_secs(settings.live_sync_interval_secs),
        shutdown_rx,
        move || {
            let state = live_state.clone();
            async move { jobs::live_sync::run_live_sync(&state).await }
        },
    ));

    info!(
        env = %settings.streamcal_env,
        retention_days = settings.retention_days,
        "worker starting"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    shutdown_tx.send(true)?;

    sweep.await?;
    live_sync.await?;

    Ok(())
}
