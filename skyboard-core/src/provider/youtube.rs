use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ProviderError,
    model::{NewsItem, NewsKind},
    normalize::display_news_date,
    provider::{NewsQuery, NewsSource, ProviderId, get_json},
};

/// Videos requested per search.
pub const MAX_RESULTS: u32 = 3;

/// Keywords used in a video query; more tends to return nothing.
const MAX_KEYWORDS: usize = 3;

/// YouTube Data API v3 video search.
#[derive(Debug, Clone)]
pub struct YouTubeSource {
    api_key: String,
    base_url: String,
    http: Client,
}

impl YouTubeSource {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self { api_key, base_url, http }
    }
}

/// `"<kw1> <kw2> <kw3> news report <location>"`
pub fn build_query(query: &NewsQuery) -> String {
    let mut parts: Vec<&str> = query
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .collect();

    parts.push("news report");

    if let Some(name) = query.location_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        parts.push(name);
    }

    parts.join(" ")
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

#[async_trait]
impl NewsSource for YouTubeSource {
    fn id(&self) -> ProviderId {
        ProviderId::YouTube
    }

    #[instrument(skip(self), fields(provider = "youtube"))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>, ProviderError> {
        let q = build_query(query);
        let url = format!("{}/youtube/v3/search", self.base_url);
        let max_results = MAX_RESULTS.to_string();

        let request = self.http.get(url).query(&[
            ("part", "snippet"),
            ("q", q.as_str()),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("order", "relevance"),
            ("relevanceLanguage", "en"),
            ("key", self.api_key.as_str()),
        ]);

        let parsed: YtSearchResponse = get_json(ProviderId::YouTube, request).await?;
        let items: Vec<NewsItem> = parsed.items.into_iter().map(map_video).collect();

        debug!(videos = items.len(), "YouTube search completed");
        Ok(items)
    }
}

fn map_video(item: YtSearchItem) -> NewsItem {
    let video_id = item.id.video_id.unwrap_or_default();
    let snippet = item.snippet.unwrap_or_default();
    let thumbnails = snippet.thumbnails.unwrap_or_default();

    let image_url = [thumbnails.high, thumbnails.medium, thumbnails.default]
        .into_iter()
        .flatten()
        .find_map(|t| t.url);

    NewsItem {
        id: video_id.clone(),
        title: snippet.title.unwrap_or_default(),
        source: snippet
            .channel_title
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "YouTube".to_string()),
        url: watch_url(&video_id),
        description: snippet
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "No description available.".to_string()),
        published_at: display_news_date(snippet.published_at.as_deref()),
        raw_published_at: snippet.published_at,
        image_url,
        kind: NewsKind::Video { video_id },
    }
}

#[derive(Debug, Default, Deserialize)]
struct YtThumbnail {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YtThumbnails {
    default: Option<YtThumbnail>,
    medium: Option<YtThumbnail>,
    high: Option<YtThumbnail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YtSnippet {
    published_at: Option<String>,
    title: Option<String>,
    description: Option<String>,
    channel_title: Option<String>,
    thumbnails: Option<YtThumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YtVideoId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YtSearchItem {
    id: YtVideoId,
    snippet: Option<YtSnippet>,
}

#[derive(Debug, Deserialize)]
struct YtSearchResponse {
    #[serde(default)]
    items: Vec<YtSearchItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_limits_keywords_and_appends_location() {
        let query = NewsQuery {
            keywords: vec!["rain".into(), "flood".into(), "storm".into(), "wind".into()],
            location_name: Some("Dublin, IE".into()),
        };
        assert_eq!(build_query(&query), "rain flood storm news report Dublin, IE");
    }

    #[test]
    fn query_without_keywords() {
        assert_eq!(build_query(&NewsQuery::default()), "news report");
    }

    #[test]
    fn video_mapping_prefers_high_thumbnail() {
        let json = serde_json::json!({
            "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
            "snippet": {
                "publishedAt": "2024-03-10T12:00:00Z",
                "title": "Storm update",
                "description": "",
                "channelTitle": "Weather Channel",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/default.jpg" },
                    "high": { "url": "https://i.ytimg.com/high.jpg" }
                }
            }
        });
        let item: YtSearchItem = serde_json::from_value(json).unwrap();
        let video = map_video(item);

        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(video.image_url.as_deref(), Some("https://i.ytimg.com/high.jpg"));
        assert_eq!(video.description, "No description available.");
        assert_eq!(video.kind, NewsKind::Video { video_id: "dQw4w9WgXcQ".into() });
        assert!(video.is_displayable());
    }

    #[test]
    fn channel_results_without_video_id_are_not_displayable() {
        let json = serde_json::json!({
            "id": { "kind": "youtube#channel", "channelId": "UC123" },
            "snippet": { "title": "A channel" }
        });
        let item: YtSearchItem = serde_json::from_value(json).unwrap();
        let video = map_video(item);

        assert_eq!(video.source, "YouTube");
        assert!(video.image_url.is_none());
        assert!(!video.is_displayable());
    }
}
