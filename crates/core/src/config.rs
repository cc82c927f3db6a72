use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub streamcal_env: String,
    pub api_bind: String,
    pub youtube_api_key: String,
    pub youtube_base_url: String,
    pub retention_days: u32,
    pub default_days_ago: u32,
    pub channel_pause_ms: u64,
    pub sweep_interval_secs: u64,
    pub live_sync_interval_secs: u64,
    pub service_token: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, std::env::VarError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let database_url =
            lookup("DATABASE_URL").or_else(|_| lookup("STREAMCAL_DATABASE_URL"))?;
        let streamcal_env = lookup("STREAMCAL_ENV").unwrap_or_else(|_| "dev".to_string());
        let api_bind = lookup("STREAMCAL_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let youtube_api_key = lookup("YOUTUBE_API_KEY")?;
        let youtube_base_url = lookup("STREAMCAL_YOUTUBE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_YOUTUBE_BASE_URL.to_string());
        let retention_days = lookup("STREAMCAL_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(365);
        let default_days_ago = lookup("STREAMCAL_DEFAULT_DAYS_AGO")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);
        let channel_pause_ms = lookup("STREAMCAL_CHANNEL_PAUSE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let sweep_interval_secs = lookup("STREAMCAL_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);
        let live_sync_interval_secs = lookup("STREAMCAL_LIVE_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);
        let service_token = lookup("STREAMCAL_SERVICE_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            streamcal_env,
            api_bind,
            youtube_api_key,
            youtube_base_url,
            retention_days,
            default_days_ago,
            channel_pause_ms,
            sweep_interval_secs,
            live_sync_interval_secs,
            service_token,
        })
    }

    pub fn channel_pause(&self) -> Duration {
        Duration::from_millis(self.channel_pause_ms)
    }
}
