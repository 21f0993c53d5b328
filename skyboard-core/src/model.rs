use serde::{Deserialize, Serialize};

/// Display name for a coordinate pair that could not be named.
pub const CURRENT_LOCATION_NAME: &str = "My Current Location";

/// Display name of the "resolved, but nothing found" sentinel.
pub const UNKNOWN_LOCATION_NAME: &str = "Unknown City";

/// Legacy display name some clients still store for a failed search.
pub const SEARCH_ERROR_NAME: &str = "Search Error";

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Returns `None` when either value is non-finite or out of range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        valid.then_some(Self { lat, lon })
    }
}

/// Canonical location identity produced by location resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl LocationInfo {
    pub fn new(name: impl Into<String>, coords: Coordinates) -> Self {
        Self { name: name.into(), lat: Some(coords.lat), lon: Some(coords.lon) }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), lat: None, lon: None }
    }

    /// The "not found" sentinel. Carries no coordinates.
    pub fn unknown() -> Self {
        Self::named(UNKNOWN_LOCATION_NAME)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_LOCATION_NAME && self.lat.is_none() && self.lon.is_none()
    }

    /// Coordinates usable for a weather lookup. Partial or out-of-range pairs count as absent.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.lat?, self.lon?)
    }
}

/// True for display names that carry no searchable place (sentinels and the coordinate label).
pub fn is_placeholder_name(name: &str) -> bool {
    [CURRENT_LOCATION_NAME, UNKNOWN_LOCATION_NAME, SEARCH_ERROR_NAME]
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name.trim()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherData {
    pub temp: i32,
    pub feels_like: i32,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Wind speed in km/h.
    pub wind_speed: i32,
    pub uv_index: i32,
    pub description: String,
    /// Icon code (`01d`) or MET symbol (`clearsky_day`); never empty.
    pub condition_code: String,
    pub location_name: String,
    pub observation_time: String,
    pub is_day: bool,
    /// Empty when the provider does not report it.
    pub sunrise: String,
    pub sunset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<u32>,
    /// Ordinal 0-5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollen_count: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecastItem {
    pub time: String,
    pub temp: i32,
    pub condition_code: String,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastItem {
    pub date: String,
    pub day_name: String,
    pub short_date: String,
    pub high_temp: i32,
    pub low_temp: i32,
    pub condition_code: String,
    pub description: String,
}

/// Everything the dashboard renders for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: CurrentWeatherData,
    pub hourly: Vec<HourlyForecastItem>,
    pub daily: Vec<DailyForecastItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NewsKind {
    Article,
    Video {
        #[serde(rename = "videoId")]
        video_id: String,
    },
}

/// One entry of the merged article/video feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub description: String,
    pub published_at: String,
    /// Original ISO timestamp, only used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub kind: NewsKind,
}

impl NewsItem {
    pub fn is_video(&self) -> bool {
        matches!(self.kind, NewsKind::Video { .. })
    }

    /// Items without a title, or without a link target, are not shown.
    pub fn is_displayable(&self) -> bool {
        if self.title.trim().is_empty() {
            return false;
        }

        match &self.kind {
            NewsKind::Article => !self.url.trim().is_empty(),
            NewsKind::Video { video_id } => !video_id.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKey {
    #[serde(rename = "rainTomorrow")]
    RainTomorrow,
    #[serde(rename = "tempAbove35")]
    TempAbove,
    #[serde(rename = "tempBelow5")]
    TempBelow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Boolean,
    NumberGt,
    NumberLt,
}

/// A user-configurable rule evaluated against [`WeatherData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlertPreference {
    pub id: String,
    pub label: String,
    pub key: AlertKey,
    #[serde(rename = "type")]
    pub kind: AlertType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub enabled: bool,
}
