//! HTTP client for the streamcal api with per-call timeout and bounded retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::{Backoff, Constant};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use streamcal_core::sync::SyncSummary;
use streamcal_core::types::StreamEvent;
use streamcal_core::{Error, Result};

use crate::bus::{ClientEvent, EventBus};
use crate::tasks::BackgroundQueue;
use crate::viewport::RangeFetcher;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub service_token: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PastSyncBody<'a> {
    channel_ids: &'a [String],
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LiveSyncBody<'a> {
    channel_ids: &'a [String],
}

#[derive(Deserialize)]
struct EventList {
    items: Vec<StreamEvent>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    bus: EventBus,
    background: Arc<BackgroundQueue>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, bus: EventBus) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let background = Arc::new(BackgroundQueue::new(bus.clone()));
        Ok(Self {
            http,
            config,
            bus,
            background,
        })
    }

    pub fn background(&self) -> &Arc<BackgroundQueue> {
        &self.background
    }

    pub async fn sync_past(
        &self,
        channel_ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SyncSummary> {
        let body = PastSyncBody {
            channel_ids,
            start_date: start,
            end_date: end,
        };
        self.with_retry("sync_past", || self.post_json("/v1/sync/past", &body))
            .await
    }

    pub async fn sync_live(&self, channel_ids: &[String]) -> Result<SyncSummary> {
        let body = LiveSyncBody { channel_ids };
        self.with_retry("sync_live", || self.post_json("/v1/sync/live", &body))
            .await
    }

    pub async fn list_events(
        &self,
        channel_ids: &[String],
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<StreamEvent>> {
        let mut query = vec![("channelIds", channel_ids.join(","))];
        if let Some((from, to)) = window {
            query.push(("from", from.to_string()));
            query.push(("to", to.to_string()));
        }
        let query = &query;
        let list: EventList = self
            .with_retry("list_events", || async move {
                let req = self.authorized(self.http.get(self.url("/v1/events")).query(query));
                read_json(req.send().await).await
            })
            .await?;
        Ok(list.items)
    }

    /// Queues the owner's last-seen update without waiting for it.
    pub fn touch_last_seen(self: &Arc<Self>, owner_id: &str) {
        let client = Arc::clone(self);
        let path = format!("/v1/favorites/{owner_id}/seen");
        self.background.spawn("touch_last_seen", async move {
            let (client, path) = (&client, &path);
            client
                .with_retry("touch_last_seen", || async move {
                    let req = client.authorized(client.http.post(client.url(path)));
                    let resp = req.send().await.map_err(transport)?;
                    check_status(resp).await.map(|_| ())
                })
                .await
        });
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.service_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.authorized(self.http.post(self.url(path)).json(body));
        read_json(req.send().await).await
    }

    /// Each attempt gets the full timeout. Timeouts, transport errors and 5xx
    /// responses are retried up to `max_retries` times with a fixed delay.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = Constant::new(self.config.retry_delay);
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.config.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(self.config.timeout)),
            };
            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !is_retryable(&err) || attempt >= self.config.max_retries {
                return Err(err);
            }

            attempt += 1;
            warn!(operation, attempt, max_retries = self.config.max_retries, error = %err, "retrying");
            self.bus.publish(ClientEvent::Retry {
                operation: operation.to_string(),
                attempt,
                max_retries: self.config.max_retries,
            });
            let delay = backoff.next_backoff().unwrap_or(self.config.retry_delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RangeFetcher for ApiClient {
    async fn fetch_range(&self, channel_ids: &[String], start: NaiveDate, end: NaiveDate) -> Result<()> {
        let summary = self.sync_past(channel_ids, start, end).await?;
        debug!(%start, %end, videos = summary.videos, "range synced");
        Ok(())
    }
}

fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Timeout(_) | Error::Transport(_) => true,
        Error::ExternalApi { status, .. } => *status >= 500,
        _ => false,
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    Err(Error::ExternalApi {
        status: status.as_u16(),
        message,
        quota_exceeded: false,
    })
}

async fn read_json<T: DeserializeOwned>(
    resp: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<T> {
    let resp = check_status(resp.map_err(transport)?).await?;
    resp.json::<T>().await.map_err(transport)
}
