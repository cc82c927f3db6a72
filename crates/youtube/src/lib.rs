//! YouTube Data API v3 implementation of [`VideoPlatform`].

pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;

use streamcal_core::config::DEFAULT_YOUTUBE_BASE_URL;
use streamcal_core::platform::{SearchQuery, VideoDetails, VideoPlatform, DETAILS_BATCH_SIZE};
use streamcal_core::types::LiveState;
use streamcal_core::{Error, Result};

use models::{ErrorEnvelope, SearchResponse, VideoItem, VideosResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_YOUTUBE_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| Error::Transport(format!("invalid {endpoint} response: {e}")))
    }
}

fn api_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::ExternalApi {
            status,
            quota_exceeded: envelope.error.is_quota_exceeded(),
            message: envelope.error.message,
        },
        Err(_) => Error::ExternalApi {
            status,
            message: body.to_string(),
            quota_exceeded: false,
        },
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<VideoItem> for VideoDetails {
    fn from(item: VideoItem) -> Self {
        let live = item.live_streaming_details.unwrap_or_default();
        VideoDetails {
            id: item.id,
            thumbnail: item.snippet.thumbnails.best_url(),
            title: item.snippet.title,
            channel_id: item.snippet.channel_id,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            live_state: LiveState::parse(&item.snippet.live_broadcast_content),
            scheduled_start_time: live.scheduled_start_time,
            actual_start_time: live.actual_start_time,
            actual_end_time: live.actual_end_time,
        }
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("channelId", query.channel_id.clone()),
            ("eventType", query.state.as_str().to_string()),
            ("type", "video".to_string()),
            ("maxResults", "50".to_string()),
            ("order", "date".to_string()),
        ];
        if let Some(after) = query.published_after {
            params.push(("publishedAfter", rfc3339(after)));
        }
        if let Some(before) = query.published_before {
            params.push(("publishedBefore", rfc3339(before)));
        }

        let resp: SearchResponse = self.get("search", &params).await?;
        let ids: Vec<String> = resp.items.into_iter().filter_map(|i| i.id.video_id).collect();
        debug!(channel_id = %query.channel_id, state = query.state.as_str(), hits = ids.len(), "search completed");
        Ok(ids)
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        if video_ids.len() > DETAILS_BATCH_SIZE {
            return Err(Error::InvalidRequest(format!(
                "at most {DETAILS_BATCH_SIZE} ids per details lookup, got {}",
                video_ids.len()
            )));
        }

        let params = [
            ("part", "snippet,liveStreamingDetails".to_string()),
            ("id", video_ids.join(",")),
        ];
        let resp: VideosResponse = self.get("videos", &params).await?;
        Ok(resp.items.into_iter().map(VideoDetails::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use streamcal_core::platform::BroadcastState;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> YouTubeClient {
        YouTubeClient::with_base_url("test-key", server.uri()).unwrap()
    }

    fn video_json(id: &str, broadcast: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "snippet": {
                "title": format!("Stream {id}"),
                "channelId": "UC1",
                "channelTitle": "Channel One",
                "publishedAt": "2025-03-01T10:00:00Z",
                "liveBroadcastContent": broadcast,
                "thumbnails": {"high": {"url": format!("https://img/{id}.jpg")}}
            },
            "liveStreamingDetails": {
                "scheduledStartTime": "2025-03-02T18:00:00Z"
            }
        })
    }

    #[tokio::test]
    async fn test_search_sends_expected_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("part", "snippet"))
            .and(query_param("channelId", "UC1"))
            .and(query_param("eventType", "completed"))
            .and(query_param("type", "video"))
            .and(query_param("maxResults", "50"))
            .and(query_param("order", "date"))
            .and(query_param("publishedAfter", "2025-03-01T00:00:00Z"))
            .and(query_param("publishedBefore", "2025-03-31T23:59:59Z"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "v1"}},
                    {"id": {"kind": "youtube#playlist"}},
                    {"id": {"kind": "youtube#video", "videoId": "v2"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::new("UC1", BroadcastState::Completed)
            .published_after(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
            .published_before(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap());
        let ids = client(&server).search(&query).await.unwrap();

        assert_eq!(ids, vec!["v1".to_string(), "v2".to_string()]);
    }

    #[tokio::test]
    async fn test_video_details_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("part", "snippet,liveStreamingDetails"))
            .and(query_param("id", "v1,v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [video_json("v1", "upcoming"), video_json("v2", "none")]
            })))
            .mount(&server)
            .await;

        let details = client(&server)
            .video_details(&["v1".to_string(), "v2".to_string()])
            .await
            .unwrap();

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].id, "v1");
        assert_eq!(details[0].live_state, LiveState::Upcoming);
        assert_eq!(details[0].thumbnail, "https://img/v1.jpg");
        assert_eq!(
            details[0].scheduled_start_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 18, 0, 0).unwrap())
        );
        assert_eq!(details[1].live_state, LiveState::None);
    }

    #[tokio::test]
    async fn test_search_with_details_skips_lookup_without_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .expect(0)
            .mount(&server)
            .await;

        let query = SearchQuery::new("UC1", BroadcastState::Live);
        let details = client(&server).search_with_details(&query).await.unwrap();
        assert!(details.is_empty());
    }

    #[tokio::test]
    async fn test_quota_error_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {
                    "code": 403,
                    "message": "The request cannot be completed because you have exceeded your quota.",
                    "errors": [{"reason": "quotaExceeded", "domain": "youtube.quota"}]
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&SearchQuery::new("UC1", BroadcastState::Upcoming))
            .await
            .unwrap_err();

        assert!(err.is_quota_exceeded());
        match err {
            Error::ExternalApi { status, message, .. } => {
                assert_eq!(status, 403);
                assert!(message.contains("quota"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server)
            .video_details(&["v1".to_string()])
            .await
            .unwrap_err();

        match err {
            Error::ExternalApi {
                status,
                message,
                quota_exceeded,
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
                assert!(!quota_exceeded);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_details_rejects_oversized_batch() {
        let server = MockServer::start().await;
        let ids: Vec<String> = (0..51).map(|i| format!("v{i}")).collect();

        let result = client(&server).video_details(&ids).await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }
}
