//! Video lookup via the YouTube Data API search endpoint

use crate::error::SearchError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// First video matching a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub video_id: String,
    pub url: String,
    pub title: Option<String>,
}

impl SearchResult {
    pub fn new(video_id: impl Into<String>, title: Option<String>) -> Self {
        let video_id = video_id.into();
        Self {
            url: watch_url(&video_id),
            video_id,
            title,
        }
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}

/// Something that can turn a free-text query into a single video
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// YouTube Data API v3 client
#[derive(Debug, Clone)]
pub struct YouTubeSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, SEARCH_URL)
    }

    /// Point the client at a different search endpoint
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearch {
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        debug!("Searching YouTube for: {}", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("key", self.api_key.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await.map_err(redact)?;
        first_video(body, query)
    }
}

/// Drop the request URL from transport errors; its query string holds the key.
fn redact(e: reqwest::Error) -> SearchError {
    SearchError::Http(e.without_url())
}

fn first_video(body: SearchResponse, query: &str) -> Result<SearchResult, SearchError> {
    body.items
        .into_iter()
        .find_map(|item| {
            let title = item.snippet.and_then(|s| s.title);
            item.id.video_id.map(|id| SearchResult::new(id, title))
        })
        .ok_or_else(|| SearchError::NoResults(query.to_string()))
}
