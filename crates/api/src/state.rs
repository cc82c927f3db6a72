use std::sync::Arc;

use streamcal_core::config::Settings;
use streamcal_core::favorites::FavoriteService;
use streamcal_core::store::EventStore;
use streamcal_core::sweep::RetentionSweeper;
use streamcal_core::sync::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sweeper: Arc<RetentionSweeper>,
    pub favorites: Arc<FavoriteService>,
    pub events: Arc<dyn EventStore>,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
