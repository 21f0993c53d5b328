use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ProviderError,
    model::{NewsItem, NewsKind},
    normalize::display_news_date,
    provider::{NewsQuery, NewsSource, ProviderId, get_json},
};

/// Articles requested per search.
pub const PAGE_SIZE: u32 = 3;

/// NewsAPI.org `everything` search.
#[derive(Debug, Clone)]
pub struct NewsApiSource {
    api_key: String,
    base_url: String,
    http: Client,
}

impl NewsApiSource {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self { api_key, base_url, http }
    }
}

/// Broader context for a display name: its last comma-separated segment,
/// e.g. `"Paris, France"` -> `"France"`.
///
/// Only segments longer than two characters count, so bare country codes are skipped.
pub fn region_token(location_name: &str) -> Option<&str> {
    let (_, last) = location_name.rsplit_once(',')?;
    let last = last.trim();
    (last.chars().count() > 2).then_some(last)
}

/// Quoted OR-query over the keywords, the location and its region.
pub fn build_query(query: &NewsQuery) -> String {
    let mut terms: Vec<&str> = query
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    if let Some(name) = query.location_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        terms.push(name);
        if let Some(region) = region_token(name) {
            terms.push(region);
        }
    }

    terms.iter().map(|t| format!("\"{t}\"")).collect::<Vec<_>>().join(" OR ")
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn id(&self) -> ProviderId {
        ProviderId::NewsApi
    }

    #[instrument(skip(self), fields(provider = "newsapi"))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>, ProviderError> {
        let q = build_query(query);
        if q.is_empty() {
            debug!("No search terms, skipping NewsAPI request");
            return Ok(Vec::new());
        }

        let url = format!("{}/v2/everything", self.base_url);
        let page_size = PAGE_SIZE.to_string();
        let request = self.http.get(url).query(&[
            ("q", q.as_str()),
            ("language", "en"),
            ("sortBy", "relevancy"),
            ("pageSize", page_size.as_str()),
            ("apiKey", self.api_key.as_str()),
        ]);

        let parsed: NaResponse = get_json(ProviderId::NewsApi, request).await?;
        let fetched_at = Utc::now().timestamp_millis();

        let items: Vec<NewsItem> = parsed
            .articles
            .into_iter()
            .enumerate()
            .map(|(i, article)| map_article(i, article, fetched_at))
            .collect();

        debug!(articles = items.len(), "NewsAPI search completed");
        Ok(items)
    }
}

/// Articles without a URL get a time-based id so the feed stays unique.
fn map_article(index: usize, article: NaArticle, fetched_at: i64) -> NewsItem {
    let url = article.url.unwrap_or_default();
    let id = if url.trim().is_empty() { format!("news-{index}-{fetched_at}") } else { url.clone() };

    NewsItem {
        id,
        title: article.title.unwrap_or_default(),
        source: article
            .source
            .and_then(|s| s.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown Source".to_string()),
        url,
        description: article
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "No description available.".to_string()),
        published_at: display_news_date(article.published_at.as_deref()),
        raw_published_at: article.published_at,
        image_url: article.url_to_image,
        kind: NewsKind::Article,
    }
}

#[derive(Debug, Deserialize)]
struct NaSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaArticle {
    source: Option<NaSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaResponse {
    #[serde(default)]
    articles: Vec<NaArticle>,
}
