//! MET Norway Locationforecast 2.0 (compact).
//!
//! The API returns a single timeseries, so everything the dashboard needs is
//! derived locally: the entry nearest to "now" becomes the current snapshot,
//! the following entries become the hourly series, and daily highs/lows are
//! computed by grouping samples per local calendar day.

use std::collections::HashMap;
use std::fmt::Display;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ProviderError,
    mock::HOURLY_POINTS,
    model::{
        Coordinates, CurrentWeatherData, DailyForecastItem, HourlyForecastItem, WeatherData,
    },
    normalize::{self, mps_to_kmh, round_temp, title_case},
    provider::{ProviderId, WeatherProvider, get_json},
};

/// Day groups kept from the timeseries.
pub const MAX_DAYS: usize = 7;

/// Symbol used when an entry carries no forecast summary.
pub const DEFAULT_SYMBOL: &str = "clearsky_day";

#[derive(Debug, Clone)]
pub struct MetNoProvider {
    base_url: String,
    http: Client,
}

impl MetNoProvider {
    /// The client must already carry a descriptive User-Agent.
    pub fn new(http: Client, base_url: String) -> Self {
        Self { base_url, http }
    }
}

#[async_trait]
impl WeatherProvider for MetNoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::MetNo
    }

    #[instrument(skip(self), fields(provider = "metno"))]
    async fn get_weather(
        &self,
        coords: Coordinates,
        location_name: &str,
    ) -> Result<WeatherData, ProviderError> {
        let url = format!("{}/weatherapi/locationforecast/2.0/compact", self.base_url);
        // The API rejects more than four decimals.
        let request = self.http.get(url).query(&[
            ("lat", format!("{:.4}", coords.lat)),
            ("lon", format!("{:.4}", coords.lon)),
        ]);

        let parsed: MetResponse = get_json(ProviderId::MetNo, request).await?;
        let samples: Vec<Sample> = parsed.properties.timeseries.into_iter().map(Sample::from).collect();
        debug!(samples = samples.len(), "Received MET timeseries");

        build_weather(&samples, Utc::now(), &Local, location_name)
    }
}

/// One timeseries entry reduced to the fields the dashboard uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub temp: f64,
    pub humidity: Option<f64>,
    pub wind_mps: Option<f64>,
    pub uv_index: Option<f64>,
    pub symbol: String,
}

impl From<MetEntry> for Sample {
    fn from(entry: MetEntry) -> Self {
        let details = entry.data.instant.details;
        let symbol = [entry.data.next_1_hours, entry.data.next_6_hours, entry.data.next_12_hours]
            .into_iter()
            .flatten()
            .map(|period| period.summary.symbol_code)
            .find(|code| !code.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        Self {
            time: entry.time,
            temp: details.air_temperature,
            humidity: details.relative_humidity,
            wind_mps: details.wind_speed,
            uv_index: details.ultraviolet_index_clear_sky,
            symbol,
        }
    }
}

/// Samples sharing one local calendar day, in timeseries order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub samples: Vec<Sample>,
}

impl DayGroup {
    pub fn high(&self) -> f64 {
        self.samples.iter().map(|s| s.temp).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn low(&self) -> f64 {
        self.samples.iter().map(|s| s.temp).fold(f64::INFINITY, f64::min)
    }

    /// Most frequent symbol; ties go to the one seen first.
    pub fn representative_symbol(&self) -> &str {
        most_frequent(self.samples.iter().map(|s| s.symbol.as_str())).unwrap_or(DEFAULT_SYMBOL)
    }
}

/// Index of the entry closest to `now`. A tie keeps the earlier entry.
pub fn nearest_index(samples: &[Sample], now: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;

    for (i, sample) in samples.iter().enumerate() {
        let distance = (sample.time - now).num_milliseconds().abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }

    best.map(|(i, _)| i)
}

/// Calendar date of `time` in `tz`. Pure; used both for grouping and for labels.
pub fn day_key<Tz: TimeZone>(time: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    time.with_timezone(tz).date_naive()
}

/// Groups samples by local day in first-seen order, keeping at most `max_days` groups.
pub fn group_by_day<Tz: TimeZone>(samples: &[Sample], tz: &Tz, max_days: usize) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let date = day_key(&sample.time, tz);
        match index.get(&date) {
            Some(&i) => groups[i].samples.push(sample.clone()),
            None => {
                index.insert(date, groups.len());
                groups.push(DayGroup { date, samples: vec![sample.clone()] });
            }
        }
    }

    groups.truncate(max_days);
    groups
}

fn most_frequent<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for item in order {
        let count = counts[item];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((item, count));
        }
    }

    best.map(|(item, _)| item)
}

/// Human description of a MET symbol: `"lightrainshowers_day"` -> `"Light Rain Showers"`.
pub fn describe_symbol(symbol: &str) -> String {
    let base = symbol.split('_').next().unwrap_or(symbol);

    let known = match base {
        "clearsky" => "Clear Sky",
        "fair" => "Fair",
        "partlycloudy" => "Partly Cloudy",
        "cloudy" => "Cloudy",
        "fog" => "Fog",
        "lightrain" => "Light Rain",
        "rain" => "Rain",
        "heavyrain" => "Heavy Rain",
        "lightrainandthunder" => "Light Rain And Thunder",
        "rainandthunder" => "Rain And Thunder",
        "heavyrainandthunder" => "Heavy Rain And Thunder",
        "lightrainshowers" => "Light Rain Showers",
        "rainshowers" => "Rain Showers",
        "heavyrainshowers" => "Heavy Rain Showers",
        "lightrainshowersandthunder" => "Light Rain Showers And Thunder",
        "rainshowersandthunder" => "Rain Showers And Thunder",
        "heavyrainshowersandthunder" => "Heavy Rain Showers And Thunder",
        "lightsleet" => "Light Sleet",
        "sleet" => "Sleet",
        "heavysleet" => "Heavy Sleet",
        "lightsleetandthunder" => "Light Sleet And Thunder",
        "sleetandthunder" => "Sleet And Thunder",
        "heavysleetandthunder" => "Heavy Sleet And Thunder",
        "lightsleetshowers" => "Light Sleet Showers",
        "sleetshowers" => "Sleet Showers",
        "heavysleetshowers" => "Heavy Sleet Showers",
        // MET really spells the light variants "lightssleet"/"lightssnow".
        "lightssleetshowersandthunder" => "Light Sleet Showers And Thunder",
        "sleetshowersandthunder" => "Sleet Showers And Thunder",
        "heavysleetshowersandthunder" => "Heavy Sleet Showers And Thunder",
        "lightsnow" => "Light Snow",
        "snow" => "Snow",
        "heavysnow" => "Heavy Snow",
        "lightsnowandthunder" => "Light Snow And Thunder",
        "snowandthunder" => "Snow And Thunder",
        "heavysnowandthunder" => "Heavy Snow And Thunder",
        "lightsnowshowers" => "Light Snow Showers",
        "snowshowers" => "Snow Showers",
        "heavysnowshowers" => "Heavy Snow Showers",
        "lightssnowshowersandthunder" => "Light Snow Showers And Thunder",
        "snowshowersandthunder" => "Snow Showers And Thunder",
        "heavysnowshowersandthunder" => "Heavy Snow Showers And Thunder",
        _ => return title_case(&base.replace("and", " and ")),
    };

    known.to_string()
}

/// Builds the canonical bundle from a MET timeseries.
///
/// Fails with `Parse` when fewer than 24 entries follow the current one.
pub fn build_weather<Tz: TimeZone>(
    samples: &[Sample],
    now: DateTime<Utc>,
    tz: &Tz,
    location_name: &str,
) -> Result<WeatherData, ProviderError>
where
    Tz::Offset: Display,
{
    let idx = nearest_index(samples, now)
        .ok_or_else(|| ProviderError::parse(ProviderId::MetNo, "timeseries is empty"))?;

    let hourly_samples = samples.get(idx..idx + HOURLY_POINTS).ok_or_else(|| {
        ProviderError::parse(
            ProviderId::MetNo,
            format!("expected {HOURLY_POINTS} entries from index {idx}, got {}", samples.len() - idx),
        )
    })?;

    let now_sample = &samples[idx];
    let current = CurrentWeatherData {
        temp: round_temp(now_sample.temp),
        feels_like: round_temp(now_sample.temp),
        humidity: now_sample.humidity.map(|h| h.round().clamp(0.0, 100.0) as u8).unwrap_or(0),
        wind_speed: now_sample.wind_mps.map(mps_to_kmh).unwrap_or(0),
        uv_index: now_sample.uv_index.map(round_temp).unwrap_or(0),
        description: describe_symbol(&now_sample.symbol),
        condition_code: now_sample.symbol.clone(),
        location_name: location_name.to_string(),
        observation_time: normalize::observation_time(&now_sample.time.with_timezone(tz)),
        is_day: normalize::is_day_code(&now_sample.symbol),
        sunrise: String::new(),
        sunset: String::new(),
        aqi: None,
        pollen_count: None,
    };

    let hourly = hourly_samples
        .iter()
        .map(|s| HourlyForecastItem {
            time: normalize::hour_label(&s.time.with_timezone(tz)),
            temp: round_temp(s.temp),
            condition_code: s.symbol.clone(),
            is_day: normalize::is_day_code(&s.symbol),
        })
        .collect();

    let daily = group_by_day(samples, tz, MAX_DAYS)
        .iter()
        .map(|group| {
            let symbol = group.representative_symbol();
            let (date, day_name, short_date) = normalize::day_labels(group.date);
            DailyForecastItem {
                date,
                day_name,
                short_date,
                high_temp: round_temp(group.high()),
                low_temp: round_temp(group.low()),
                condition_code: symbol.to_string(),
                description: describe_symbol(symbol),
            }
        })
        .collect();

    Ok(WeatherData { current, hourly, daily })
}

#[derive(Debug, Deserialize)]
struct MetResponse {
    properties: MetProperties,
}

#[derive(Debug, Deserialize)]
struct MetProperties {
    #[serde(default)]
    timeseries: Vec<MetEntry>,
}

#[derive(Debug, Deserialize)]
struct MetEntry {
    time: DateTime<Utc>,
    data: MetData,
}

#[derive(Debug, Deserialize)]
struct MetData {
    instant: MetInstant,
    next_1_hours: Option<MetPeriod>,
    next_6_hours: Option<MetPeriod>,
    next_12_hours: Option<MetPeriod>,
}

#[derive(Debug, Deserialize)]
struct MetInstant {
    details: MetDetails,
}

#[derive(Debug, Deserialize)]
struct MetDetails {
    air_temperature: f64,
    relative_humidity: Option<f64>,
    wind_speed: Option<f64>,
    ultraviolet_index_clear_sky: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MetPeriod {
    summary: MetSummary,
}

#[derive(Debug, Deserialize)]
struct MetSummary {
    symbol_code: String,
}
