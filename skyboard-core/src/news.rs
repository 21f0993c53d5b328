//! Merged article and video feed.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ProviderError,
    mock::mock_articles,
    model::{NewsItem, is_placeholder_name},
    normalize::sort_millis,
    provider::{NewsQuery, NewsSource},
};

/// Upper bound on items in the merged feed.
pub const MAX_FEED_ITEMS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct NewsAggregator {
    articles: Option<Arc<dyn NewsSource>>,
    videos: Option<Arc<dyn NewsSource>>,
}

impl NewsAggregator {
    pub fn new(articles: Option<Arc<dyn NewsSource>>, videos: Option<Arc<dyn NewsSource>>) -> Self {
        Self { articles, videos }
    }

    /// Never fails. Articles fall back to two mock items, videos to none.
    #[instrument(skip(self))]
    pub async fn fetch_news_feed(
        &self,
        keywords: &[String],
        location_name: Option<&str>,
    ) -> Vec<NewsItem> {
        // Mock articles name whatever location was shown; searches skip placeholder names.
        let display_name = location_name.map(str::trim).filter(|n| !n.is_empty());
        let query = NewsQuery {
            keywords: keywords.to_vec(),
            location_name: display_name.filter(|n| !is_placeholder_name(n)).map(str::to_string),
        };

        let (articles, videos) =
            tokio::join!(search(self.articles.as_deref(), &query), search(self.videos.as_deref(), &query));

        let articles = match articles {
            Some(Ok(items)) if !items.is_empty() => items,
            Some(Ok(_)) => {
                info!("Article search returned nothing, using mock articles");
                mock_articles(display_name, Utc::now())
            }
            Some(Err(e)) => {
                warn!(error = %e, "Article search failed, using mock articles");
                mock_articles(display_name, Utc::now())
            }
            None => {
                debug!("No article source configured, using mock articles");
                mock_articles(display_name, Utc::now())
            }
        };

        let videos = match videos {
            Some(Ok(items)) => items,
            Some(Err(e)) => {
                warn!(error = %e, "Video search failed");
                Vec::new()
            }
            None => Vec::new(),
        };

        let feed = merge_feed(videos, articles);
        debug!(items = feed.len(), "News feed assembled");
        feed
    }
}

async fn search(
    source: Option<&dyn NewsSource>,
    query: &NewsQuery,
) -> Option<Result<Vec<NewsItem>, ProviderError>> {
    match source {
        Some(source) => Some(source.search(query).await),
        None => None,
    }
}

/// Newest first, videos ahead of articles on equal timestamps, unique ids,
/// at most [`MAX_FEED_ITEMS`].
pub fn merge_feed(videos: Vec<NewsItem>, articles: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> =
        videos.into_iter().chain(articles).filter(NewsItem::is_displayable).collect();

    // Stable: equal keys keep videos before articles.
    items.sort_by_key(|item| std::cmp::Reverse(sort_millis(item.raw_published_at.as_deref())));

    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id.clone()));
    items.truncate(MAX_FEED_ITEMS);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::NewsKind,
        provider::ProviderId,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn article(id: &str, published: &str) -> NewsItem {
        NewsItem {
            id: id.into(),
            title: format!("Article {id}"),
            source: "Paper".into(),
            url: format!("https://example.com/{id}"),
            description: String::new(),
            published_at: String::new(),
            raw_published_at: Some(published.into()),
            image_url: None,
            kind: NewsKind::Article,
        }
    }

    fn video(id: &str, published: &str) -> NewsItem {
        NewsItem {
            url: format!("https://www.youtube.com/watch?v={id}"),
            kind: NewsKind::Video { video_id: id.into() },
            ..article(id, published)
        }
    }

    #[derive(Debug)]
    struct FixedSource {
        id: ProviderId,
        result: Mutex<Option<Result<Vec<NewsItem>, ProviderError>>>,
        seen: Mutex<Option<NewsQuery>>,
    }

    impl FixedSource {
        fn new(id: ProviderId, result: Result<Vec<NewsItem>, ProviderError>) -> Arc<Self> {
            Arc::new(Self { id, result: Mutex::new(Some(result)), seen: Mutex::new(None) })
        }
    }

    #[async_trait]
    impl NewsSource for FixedSource {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>, ProviderError> {
            *self.seen.lock().unwrap() = Some(query.clone());
            self.result.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[test]
    fn merge_sorts_newest_first_with_videos_on_ties() {
        let feed = merge_feed(
            vec![video("v1", "2024-05-01T10:00:00Z")],
            vec![
                article("a1", "2024-05-01T10:00:00Z"),
                article("a2", "2024-05-02T10:00:00Z"),
                article("a3", "not a date"),
            ],
        );

        let ids: Vec<&str> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a2", "v1", "a1", "a3"]);
    }

    #[test]
    fn merge_drops_duplicates_and_caps_length() {
        let articles = (0..8).map(|i| article(&format!("a{i}"), "2024-05-01T10:00:00Z")).collect();
        let videos = vec![video("a0", "2024-05-01T10:00:00Z")];

        let feed = merge_feed(videos, articles);
        assert_eq!(feed.len(), MAX_FEED_ITEMS);
        assert!(feed[0].is_video());

        let ids: HashSet<&str> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), feed.len());
    }

    #[test]
    fn merge_drops_undisplayable_items() {
        let mut no_title = article("a1", "2024-05-01T10:00:00Z");
        no_title.title.clear();
        let no_id = video("", "2024-05-01T10:00:00Z");

        assert!(merge_feed(vec![no_id], vec![no_title]).is_empty());
    }

    #[tokio::test]
    async fn failing_articles_and_two_videos_give_four_items() {
        let articles = FixedSource::new(
            ProviderId::NewsApi,
            Err(ProviderError::Http { provider: ProviderId::NewsApi, status: 500, body: String::new() }),
        );
        let videos = FixedSource::new(
            ProviderId::YouTube,
            Ok(vec![video("v1", "2024-01-01T00:00:00Z"), video("v2", "2024-01-02T00:00:00Z")]),
        );
        let aggregator = NewsAggregator::new(
            Some(articles as Arc<dyn NewsSource>),
            Some(videos as Arc<dyn NewsSource>),
        );

        let feed = aggregator.fetch_news_feed(&["storm".to_string()], Some("Paris, France")).await;

        assert_eq!(feed.len(), 4);
        let ids: Vec<&str> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["mock-article-2", "mock-article-1", "v2", "v1"]);
    }

    #[tokio::test]
    async fn empty_article_result_uses_mocks() {
        let articles = FixedSource::new(ProviderId::NewsApi, Ok(Vec::new()));
        let aggregator = NewsAggregator::new(Some(articles as Arc<dyn NewsSource>), None);

        let feed = aggregator.fetch_news_feed(&[], None).await;
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|i| i.id.starts_with("mock-article-")));
    }

    #[tokio::test]
    async fn mock_articles_keep_placeholder_location_name() {
        let feed = NewsAggregator::default().fetch_news_feed(&[], Some(" My Current Location ")).await;

        let local = feed.iter().find(|i| i.id == "mock-article-1").unwrap();
        assert_eq!(local.title, "Local Weather Patterns Shifting in My Current Location, Experts Say");

        let feed = NewsAggregator::default().fetch_news_feed(&[], Some("  ")).await;
        let local = feed.iter().find(|i| i.id == "mock-article-1").unwrap();
        assert!(local.title.contains("in Region,"));
    }

    #[tokio::test]
    async fn sentinel_location_is_not_searched() {
        let articles = FixedSource::new(ProviderId::NewsApi, Ok(vec![article("a1", "2024-01-01T00:00:00Z")]));
        let aggregator = NewsAggregator::new(Some(articles.clone() as Arc<dyn NewsSource>), None);

        let feed = aggregator.fetch_news_feed(&["heat".to_string()], Some("My Current Location")).await;
        assert_eq!(feed.len(), 1);

        let seen = articles.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.keywords, ["heat"]);
        assert!(seen.location_name.is_none());
    }
}
