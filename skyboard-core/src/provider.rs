use crate::{
    Config,
    error::ProviderError,
    model::{Coordinates, NewsItem, WeatherData},
    normalize::truncate_body,
    provider::{
        metno::MetNoProvider, newsapi::NewsApiSource, openweather::OpenWeatherProvider,
        youtube::YouTubeSource,
    },
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

pub mod metno;
pub mod newsapi;
pub mod openweather;
pub mod youtube;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    MetNo,
    NewsApi,
    YouTube,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::MetNo => "metno",
            ProviderId::NewsApi => "newsapi",
            ProviderId::YouTube => "youtube",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::MetNo, ProviderId::NewsApi, ProviderId::YouTube]
    }

    /// MET Norway identifies clients by User-Agent instead of a key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderId::MetNo)
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            ProviderId::OpenWeather => Some("OPENWEATHERMAP_API_KEY"),
            ProviderId::NewsApi => Some("NEWSAPI_API_KEY"),
            ProviderId::YouTube => Some("YOUTUBE_API_KEY"),
            ProviderId::MetNo => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "https://api.openweathermap.org",
            ProviderId::MetNo => "https://api.met.no",
            ProviderId::NewsApi => "https://newsapi.org",
            ProviderId::YouTube => "https://www.googleapis.com",
        }
    }

    pub fn is_weather_provider(&self) -> bool {
        matches!(self, ProviderId::OpenWeather | ProviderId::MetNo)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "metno" => Ok(ProviderId::MetNo),
            "newsapi" => Ok(ProviderId::NewsApi),
            "youtube" => Ok(ProviderId::YouTube),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, metno, newsapi, youtube."
            )),
        }
    }
}

/// A source of current, hourly and daily conditions for a coordinate pair.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn get_weather(
        &self,
        coords: Coordinates,
        location_name: &str,
    ) -> Result<WeatherData, ProviderError>;
}

/// A named place returned by a geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// `"name, state, country"` with empty parts omitted.
    pub fn display_name(&self) -> String {
        [Some(self.name.as_str()), self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Forward and reverse geocoding. `Ok(None)` means "nothing found".
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn forward(&self, query: &str) -> Result<Option<Place>, ProviderError>;

    async fn reverse(&self, coords: Coordinates) -> Result<Option<Place>, ProviderError>;
}

/// Inputs shared by the article and video searches.
#[derive(Debug, Clone, Default)]
pub struct NewsQuery {
    pub keywords: Vec<String>,
    /// Display name of the location, already stripped of sentinel names.
    pub location_name: Option<String>,
}

/// A search backend producing feed items (articles or videos).
#[async_trait]
pub trait NewsSource: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn search(&self, query: &NewsQuery) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Shared HTTP client with the configured timeout and User-Agent.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

/// Sends a request and decodes a JSON body, mapping every failure to a [`ProviderError`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let res = request.send().await.map_err(|e| ProviderError::Unavailable {
        provider,
        message: if e.is_timeout() { format!("timed out: {e}") } else { e.to_string() },
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| ProviderError::Unavailable {
        provider,
        message: format!("Failed to read response body: {e}"),
    })?;

    debug!(%provider, status = %status, bytes = body.len(), "Received provider response");

    if !status.is_success() {
        return Err(ProviderError::Http {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::parse(provider, e.to_string()))
}

/// Construct the weather strategy selected in config.
///
/// Returns `None` when the selected provider has no usable key, which makes
/// every weather request use mock data.
pub fn weather_provider_from_config(
    config: &Config,
    http: &Client,
) -> anyhow::Result<Option<Arc<dyn WeatherProvider>>> {
    let id = config.weather_provider_id()?;
    let base_url = config.provider_base_url(id).to_string();

    let provider: Option<Arc<dyn WeatherProvider>> = match id {
        ProviderId::OpenWeather => config.provider_api_key(id).map(|key| {
            Arc::new(OpenWeatherProvider::new(http.clone(), key.to_owned(), base_url))
                as Arc<dyn WeatherProvider>
        }),
        ProviderId::MetNo => Some(Arc::new(MetNoProvider::new(http.clone(), base_url))),
        other => {
            return Err(anyhow::anyhow!(
                "Provider '{other}' cannot supply weather. Use openweather or metno."
            ));
        }
    };

    Ok(provider)
}

/// Construct the geocoder, if OpenWeather credentials are present.
pub fn geocoder_from_config(config: &Config, http: &Client) -> Option<Arc<dyn Geocoder>> {
    let id = ProviderId::OpenWeather;
    config.provider_api_key(id).map(|key| {
        Arc::new(OpenWeatherProvider::new(
            http.clone(),
            key.to_owned(),
            config.provider_base_url(id).to_string(),
        )) as Arc<dyn Geocoder>
    })
}

pub fn article_source_from_config(config: &Config, http: &Client) -> Option<Arc<dyn NewsSource>> {
    let id = ProviderId::NewsApi;
    config.provider_api_key(id).map(|key| {
        Arc::new(NewsApiSource::new(
            http.clone(),
            key.to_owned(),
            config.provider_base_url(id).to_string(),
        )) as Arc<dyn NewsSource>
    })
}

pub fn video_source_from_config(config: &Config, http: &Client) -> Option<Arc<dyn NewsSource>> {
    let id = ProviderId::YouTube;
    config.provider_api_key(id).map(|key| {
        Arc::new(YouTubeSource::new(
            http.clone(),
            key.to_owned(),
            config.provider_base_url(id).to_string(),
        )) as Arc<dyn NewsSource>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn only_metno_works_without_key() {
        assert!(!ProviderId::MetNo.requires_api_key());
        assert!(ProviderId::MetNo.env_var().is_none());
        assert!(ProviderId::OpenWeather.requires_api_key());
        assert_eq!(ProviderId::NewsApi.env_var(), Some("NEWSAPI_API_KEY"));
    }

    #[test]
    fn place_display_name_skips_empty_parts() {
        let place = Place {
            name: "Springfield".into(),
            state: Some(String::new()),
            country: Some("US".into()),
            lat: 39.8,
            lon: -89.6,
        };
        assert_eq!(place.display_name(), "Springfield, US");

        let place = Place { state: Some("Illinois".into()), ..place };
        assert_eq!(place.display_name(), "Springfield, Illinois, US");
    }

    #[test]
    fn weather_provider_is_absent_without_key() {
        let cfg = Config::default();
        let http = http_client(&cfg).unwrap();
        let provider = weather_provider_from_config(&cfg, &http).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn metno_needs_no_key() {
        let mut cfg = Config::default();
        cfg.set_weather_provider(ProviderId::MetNo).unwrap();
        let http = http_client(&cfg).unwrap();

        let provider = weather_provider_from_config(&cfg, &http).unwrap();
        assert_eq!(provider.map(|p| p.id()), Some(ProviderId::MetNo));
    }

    #[test]
    fn news_provider_cannot_serve_weather() {
        let cfg = Config { weather_provider: Some("newsapi".into()), ..Config::default() };
        let http = http_client(&cfg).unwrap();
        let err = weather_provider_from_config(&cfg, &http).unwrap_err();
        assert!(err.to_string().contains("cannot supply weather"));
    }

    #[test]
    fn sources_follow_configured_keys() {
        let mut cfg = Config::default();
        let http = http_client(&cfg).unwrap();
        assert!(article_source_from_config(&cfg, &http).is_none());
        assert!(video_source_from_config(&cfg, &http).is_none());
        assert!(geocoder_from_config(&cfg, &http).is_none());

        cfg.upsert_provider_api_key(ProviderId::NewsApi, "NEWS".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OWM".into());
        assert!(article_source_from_config(&cfg, &http).is_some());
        assert!(geocoder_from_config(&cfg, &http).is_some());
    }
}
