use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    error::ProviderError,
    mock::HOURLY_POINTS,
    model::{
        Coordinates, CurrentWeatherData, DailyForecastItem, HourlyForecastItem, WeatherData,
    },
    normalize::{self, aqi_from_category, condition_or_default, mps_to_kmh, round_temp, title_case},
    provider::{Geocoder, Place, ProviderId, WeatherProvider, get_json},
};

/// Days kept from the daily series; the dashboard shows five.
pub const DAILY_DAYS: usize = 5;

/// OpenWeather One Call forecasts, air quality and geocoding.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, api_key: String, base_url: String) -> Self {
        Self { api_key, base_url, http }
    }

    const ID: ProviderId = ProviderId::OpenWeather;

    async fn fetch_onecall(&self, coords: Coordinates) -> Result<OwOneCallResponse, ProviderError> {
        let url = format!("{}/data/3.0/onecall", self.base_url);
        let request = self.http.get(url).query(&[
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("exclude", "minutely".to_string()),
            ("units", "metric".to_string()),
            ("appid", self.api_key.clone()),
        ]);

        get_json(Self::ID, request).await
    }

    /// Air quality on the display scale, or `None` when unavailable for any reason.
    async fn fetch_aqi(&self, coords: Coordinates) -> Option<u32> {
        let url = format!("{}/data/2.5/air_pollution", self.base_url);
        let request = self.http.get(url).query(&[
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("appid", self.api_key.clone()),
        ]);

        match get_json::<OwAirPollutionResponse>(Self::ID, request).await {
            Ok(parsed) => parsed.list.first().map(|entry| aqi_from_category(entry.main.aqi)),
            Err(e) => {
                warn!(error = %e, "Could not fetch AQI data");
                None
            }
        }
    }

    async fn geocode(&self, path: &str, params: &[(&str, String)]) -> Result<Option<Place>, ProviderError> {
        let url = format!("{}/geo/1.0/{path}", self.base_url);
        let request = self
            .http
            .get(url)
            .query(params)
            .query(&[("limit", "1"), ("appid", self.api_key.as_str())]);

        let matches: Vec<OwGeoMatch> = get_json(Self::ID, request).await?;
        debug!(path, matches = matches.len(), "Geocoding completed");

        Ok(matches.into_iter().next().map(|m| Place {
            name: m.name,
            state: m.state,
            country: m.country,
            lat: m.lat,
            lon: m.lon,
        }))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn get_weather(
        &self,
        coords: Coordinates,
        location_name: &str,
    ) -> Result<WeatherData, ProviderError> {
        // The AQI call is independent of the forecast and cannot fail it.
        let (forecast, aqi) = tokio::join!(self.fetch_onecall(coords), self.fetch_aqi(coords));

        let mut data = transform_onecall(forecast?, location_name)?;
        data.current.aqi = aqi;
        Ok(data)
    }
}

#[async_trait]
impl Geocoder for OpenWeatherProvider {
    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn forward(&self, query: &str) -> Result<Option<Place>, ProviderError> {
        self.geocode("direct", &[("q", query.to_string())]).await
    }

    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn reverse(&self, coords: Coordinates) -> Result<Option<Place>, ProviderError> {
        self.geocode("reverse", &[("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())])
            .await
    }
}

/// Maps a One Call payload onto the canonical model.
///
/// Fails with `Parse` when the series are too short to honor the
/// 24-hour / at-least-one-day shape.
fn transform_onecall(
    parsed: OwOneCallResponse,
    location_name: &str,
) -> Result<WeatherData, ProviderError> {
    let invalid = |msg: String| ProviderError::parse(ProviderId::OpenWeather, msg);

    if parsed.hourly.len() < HOURLY_POINTS {
        return Err(invalid(format!(
            "expected at least {HOURLY_POINTS} hourly entries, got {}",
            parsed.hourly.len()
        )));
    }
    if parsed.daily.is_empty() {
        return Err(invalid("response contained no daily data".to_string()));
    }

    let local = |ts: i64| {
        normalize::unix_to_local(ts).ok_or_else(|| invalid(format!("invalid timestamp {ts}")))
    };

    let current = &parsed.current;
    let (code, description) = summary(&current.weather);

    let current = CurrentWeatherData {
        temp: round_temp(current.temp),
        feels_like: round_temp(current.feels_like),
        humidity: current.humidity,
        wind_speed: mps_to_kmh(current.wind_speed),
        uv_index: round_temp(current.uvi),
        is_day: normalize::is_day_code(&code),
        description,
        condition_code: code,
        location_name: location_name.to_string(),
        observation_time: normalize::observation_time(&local(current.dt)?),
        sunrise: current
            .sunrise
            .and_then(normalize::unix_to_local)
            .map(|t| normalize::clock_time(&t))
            .unwrap_or_default(),
        sunset: current
            .sunset
            .and_then(normalize::unix_to_local)
            .map(|t| normalize::clock_time(&t))
            .unwrap_or_default(),
        aqi: None,
        pollen_count: None,
    };

    let hourly = parsed
        .hourly
        .iter()
        .take(HOURLY_POINTS)
        .map(|hour| {
            let (code, _) = summary(&hour.weather);
            Ok(HourlyForecastItem {
                time: normalize::hour_label(&local(hour.dt)?),
                temp: round_temp(hour.temp),
                is_day: normalize::is_day_code(&code),
                condition_code: code,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    let daily = parsed
        .daily
        .iter()
        .take(DAILY_DAYS)
        .map(|day| {
            let (code, description) = summary(&day.weather);
            let (date, day_name, short_date) = normalize::day_labels(local(day.dt)?.date_naive());
            Ok(DailyForecastItem {
                date,
                day_name,
                short_date,
                high_temp: round_temp(day.temp.max),
                low_temp: round_temp(day.temp.min),
                condition_code: code,
                description,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    debug!(hourly = hourly.len(), daily = daily.len(), "Transformed OpenWeather forecast");

    Ok(WeatherData { current, hourly, daily })
}

/// Condition code and title-cased description of the first weather entry.
fn summary(weather: &[OwWeather]) -> (String, String) {
    let first = weather.first();
    let code = condition_or_default(first.map(|w| w.icon.as_str()));
    let description = first
        .map(|w| title_case(&w.description))
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "Clear Sky".to_string());

    (code, description)
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    uvi: f64,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    current: OwCurrent,
    #[serde(default)]
    hourly: Vec<OwHourly>,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

#[derive(Debug, Deserialize)]
struct OwAirMain {
    aqi: u32,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAirMain,
}

#[derive(Debug, Deserialize)]
struct OwAirPollutionResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}
