use anyhow::Result;
use tracing::debug;

use crate::{
    Config,
    alerts::evaluate_alerts,
    error::{ResolveError, WeatherFetchError},
    location::LocationResolver,
    model::{LocationInfo, NewsItem, WeatherAlertPreference, WeatherData},
    news::NewsAggregator,
    provider::{
        article_source_from_config, geocoder_from_config, http_client, video_source_from_config,
        weather_provider_from_config,
    },
    weather::WeatherAggregator,
};

/// Entry point for front-ends: location, weather and news behind one value.
///
/// Cheap to clone; all providers share one HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Skyboard {
    locations: LocationResolver,
    weather: WeatherAggregator,
    news: NewsAggregator,
}

impl Skyboard {
    /// Wires live providers for every configured key and mocks for the rest.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = http_client(config)?;

        let weather = weather_provider_from_config(config, &http)?;
        let geocoder = geocoder_from_config(config, &http);
        let articles = article_source_from_config(config, &http);
        let videos = video_source_from_config(config, &http);

        debug!(
            weather = ?weather.as_ref().map(|p| p.id()),
            geocoder = geocoder.is_some(),
            articles = articles.is_some(),
            videos = videos.is_some(),
            "Providers initialised"
        );

        Ok(Self::with_parts(
            LocationResolver::new(geocoder),
            WeatherAggregator::new(weather),
            NewsAggregator::new(articles, videos),
        ))
    }

    pub fn with_parts(
        locations: LocationResolver,
        weather: WeatherAggregator,
        news: NewsAggregator,
    ) -> Self {
        Self { locations, weather, news }
    }

    pub async fn resolve_location(&self, query: &str) -> Result<LocationInfo, ResolveError> {
        self.locations.resolve_location(query).await
    }

    pub async fn fetch_weather(
        &self,
        location: &LocationInfo,
    ) -> Result<WeatherData, WeatherFetchError> {
        self.weather.fetch_weather(location).await
    }

    pub async fn fetch_news(&self, keywords: &[String], location_name: Option<&str>) -> Vec<NewsItem> {
        self.news.fetch_news_feed(keywords, location_name).await
    }

    /// Resolve, fetch and evaluate alerts in one go.
    pub async fn alerts_for(
        &self,
        query: &str,
        prefs: &[WeatherAlertPreference],
    ) -> Result<(LocationInfo, Vec<String>)> {
        let location = self.resolve_location(query).await?;
        let weather = self.fetch_weather(&location).await?;
        Ok((location, evaluate_alerts(prefs, &weather)))
    }
}
