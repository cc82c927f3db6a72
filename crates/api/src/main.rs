use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

mod error;
mod middleware;
mod routes;
mod state;

use streamcal_core::config::Settings;
use streamcal_core::favorites::FavoriteService;
use streamcal_core::sweep::RetentionSweeper;
use streamcal_core::sync::Orchestrator;
use streamcal_db::PgStore;
use streamcal_youtube::YouTubeClient;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()
        .map_err(|e| anyhow::anyhow!("DATABASE_URL and YOUTUBE_API_KEY must be set: {e}"))?;

    let pool = streamcal_db::connect(&settings.database_url).await?;
    streamcal_db::MIGRATOR.run(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let platform = Arc::new(YouTubeClient::with_base_url(
        settings.youtube_api_key.clone(),
        settings.youtube_base_url.clone(),
    )?);

    let orchestrator = Orchestrator::new(store.clone(), store.clone(), store.clone(), platform)
        .with_pause(settings.channel_pause());

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        sweeper: Arc::new(RetentionSweeper::new(store.clone(), store.clone(), store.clone())),
        favorites: Arc::new(FavoriteService::new(store.clone(), store.clone(), store.clone())),
        events: store,
        settings: Arc::new(settings.clone()),
    };

    let app = routes::app(state);

    let addr: SocketAddr = settings.api_bind.parse()?;
    info!(
        %addr,
        env = %settings.streamcal_env,
        auth = settings.service_token.is_some(),
        "starting api"
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
