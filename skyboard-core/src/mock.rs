//! Synthetic weather and news payloads used whenever a live provider is
//! unconfigured or failing.
//!
//! Everything here is shaped exactly like real data so the dashboard never has
//! to special-case a fallback. Randomness comes from the caller's RNG, which
//! keeps the generators pure and lets tests seed them.

use chrono::{DateTime, Duration, Local, NaiveTime, Timelike, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::model::{
    Coordinates, CurrentWeatherData, DailyForecastItem, HourlyForecastItem, NewsItem, NewsKind,
    WeatherData,
};
use crate::normalize;

/// Hourly points in every forecast.
pub const HOURLY_POINTS: usize = 24;

/// Days the dashboard shows when data is synthesized.
pub const MOCK_DAILY_DAYS: usize = 5;

/// Icon families (without the day/night suffix) and their descriptions.
const CONDITIONS: &[(&str, &str)] = &[
    ("01", "Clear Sky"),
    ("02", "Few Clouds"),
    ("03", "Scattered Clouds"),
    ("04", "Broken Clouds"),
    ("09", "Shower Rain"),
    ("10", "Rain"),
    ("11", "Thunderstorm"),
    ("13", "Snow"),
    ("50", "Mist"),
];

const FACTS: &[&str] = &[
    "The highest temperature ever recorded on Earth was 56.7°C (134°F) in Death Valley, USA.",
    "Clouds can weigh over a million pounds!",
    "Snowflakes always have six sides.",
    "Lightning strikes the Earth about 100 times every second.",
    "The windiest place on Earth is Commonwealth Bay, Antarctica.",
    "Rain contains Vitamin B12.",
    "A rainbow is actually a full circle of light, but from the ground we only see part of it.",
    "Fog is essentially a cloud that is close to the ground.",
    "Hurricanes can release energy equivalent to 10,000 nuclear bombs.",
    "Some tornadoes can be faster than Formula One race cars.",
    "Weather forecasting has been practiced for thousands of years, but modern methods began in the 19th century.",
    "The Atacama Desert in Chile is the driest place on Earth, with some areas not seeing rain for centuries.",
];

fn is_day_hour(hour: u32) -> bool {
    (6..18).contains(&hour)
}

fn pick_condition<R: Rng + ?Sized>(rng: &mut R) -> (&'static str, &'static str) {
    CONDITIONS.choose(rng).copied().unwrap_or(("01", "Clear Sky"))
}

fn with_suffix(base: &str, is_day: bool) -> String {
    format!("{base}{}", if is_day { 'd' } else { 'n' })
}

/// Full mock bundle: current conditions, 24 hourly points and 5 days.
pub fn mock_weather<R: Rng + ?Sized>(
    rng: &mut R,
    location_name: &str,
    now: DateTime<Local>,
) -> WeatherData {
    debug!(location = %location_name, "Generating mock weather data");

    WeatherData {
        current: mock_current(rng, location_name, now),
        hourly: mock_hourly(rng, now),
        daily: mock_daily(rng, now, MOCK_DAILY_DAYS),
    }
}

pub fn mock_current<R: Rng + ?Sized>(
    rng: &mut R,
    location_name: &str,
    now: DateTime<Local>,
) -> CurrentWeatherData {
    let is_day = is_day_hour(now.hour());
    let (base, description) = pick_condition(rng);

    let sunrise = NaiveTime::from_hms_opt(6, rng.gen_range(15..45), 0);
    let sunset = NaiveTime::from_hms_opt(18, rng.gen_range(30..60), 0);
    let clock = |t: Option<NaiveTime>| t.map(|t| t.format("%-I:%M %p").to_string()).unwrap_or_default();

    CurrentWeatherData {
        temp: rng.gen_range(5..30),
        feels_like: rng.gen_range(3..28),
        humidity: rng.gen_range(30..100),
        wind_speed: rng.gen_range(5..35),
        uv_index: rng.gen_range(0..11),
        description: description.to_string(),
        condition_code: with_suffix(base, is_day),
        location_name: location_name.to_string(),
        observation_time: normalize::observation_time(&now),
        is_day,
        sunrise: clock(sunrise),
        sunset: clock(sunset),
        aqi: Some(rng.gen_range(10..160)),
        pollen_count: Some(rng.gen_range(0..5)),
    }
}

/// 24 consecutive hours starting at the top of the current hour.
pub fn mock_hourly<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Local>) -> Vec<HourlyForecastItem> {
    let start = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    (0..HOURLY_POINTS)
        .map(|i| {
            let t = start + Duration::hours(i as i64);
            let is_day = is_day_hour(t.hour());
            let (base, _) = pick_condition(rng);

            HourlyForecastItem {
                time: normalize::hour_label(&t),
                temp: rng.gen_range(5..25),
                condition_code: with_suffix(base, is_day),
                is_day,
            }
        })
        .collect()
}

/// `days` consecutive days starting today. Daily icons always use the day variant.
pub fn mock_daily<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Local>,
    days: usize,
) -> Vec<DailyForecastItem> {
    let today = now.date_naive();

    (0..days)
        .map(|i| {
            let date = today + Duration::days(i as i64);
            let (date_label, day_name, short_date) = normalize::day_labels(date);
            let high_temp = rng.gen_range(10..25);
            let (base, description) = pick_condition(rng);

            DailyForecastItem {
                date: date_label,
                day_name,
                short_date,
                high_temp,
                low_temp: high_temp - rng.gen_range(3..8),
                condition_code: with_suffix(base, true),
                description: description.to_string(),
            }
        })
        .collect()
}

/// Synthetic coordinates with four decimals, always in range.
pub fn mock_coordinates<R: Rng + ?Sized>(rng: &mut R) -> Coordinates {
    let round4 = |v: f64| (v * 10_000.0).round() / 10_000.0;
    let lat = round4(rng.gen_range(-90.0..=90.0));
    let lon = round4(rng.gen_range(-180.0..=180.0));

    Coordinates { lat, lon }
}

/// The two articles substituted when the news provider yields nothing.
pub fn mock_articles(location_name: Option<&str>, now: DateTime<Utc>) -> Vec<NewsItem> {
    let region = location_name.unwrap_or("Region");
    let region_lower = location_name.unwrap_or("the region");
    let yesterday = now - Duration::days(1);

    vec![
        NewsItem {
            id: "mock-article-1".to_string(),
            title: format!("Local Weather Patterns Shifting in {region}, Experts Say"),
            source: "Mock Local News".to_string(),
            url: "#mock-local-weather".to_string(),
            description: format!(
                "Experts in {region_lower} discuss recent changes in weather patterns and their potential impact. This is mock data."
            ),
            published_at: normalize::news_date(&yesterday.with_timezone(&Local)),
            raw_published_at: Some(yesterday.to_rfc3339()),
            image_url: Some(
                "https://placehold.co/300x200.png/FFA07A/FFFFFF?text=Local+Weather".to_string(),
            ),
            kind: NewsKind::Article,
        },
        NewsItem {
            id: "mock-article-2".to_string(),
            title: "Upcoming Heatwave Advisory Issued for Many Areas (Mock Data)".to_string(),
            source: "Global Climate Watch (Mock)".to_string(),
            url: "#mock-heatwave".to_string(),
            description: "A significant heatwave is expected to affect multiple regions in the coming days. This is mock data, please add a NewsAPI key.".to_string(),
            published_at: normalize::news_date(&now.with_timezone(&Local)),
            raw_published_at: Some(now.to_rfc3339()),
            image_url: Some(
                "https://placehold.co/300x200.png/FFD700/000000?text=Heatwave+Advisory".to_string(),
            ),
            kind: NewsKind::Article,
        },
    ]
}

pub fn weather_fact<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FACTS.choose(rng).copied().unwrap_or(FACTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn mock_weather_has_dashboard_shape() {
        let data = mock_weather(&mut rng(), "Lisbon", Local::now());

        assert_eq!(data.hourly.len(), HOURLY_POINTS);
        assert_eq!(data.daily.len(), MOCK_DAILY_DAYS);
        assert_eq!(data.current.location_name, "Lisbon");
        assert!(!data.current.condition_code.is_empty());
        assert!(data.current.aqi.is_some());
        assert!(data.current.pollen_count.is_some_and(|p| p <= 5));
    }

    #[test]
    fn mock_daily_keeps_high_above_low() {
        for day in mock_daily(&mut rng(), Local::now(), 7) {
            assert!(day.high_temp > day.low_temp);
            assert!(day.condition_code.ends_with('d'));
        }
    }

    #[test]
    fn mock_hourly_day_flag_matches_code() {
        for hour in mock_hourly(&mut rng(), Local::now()) {
            assert_eq!(hour.is_day, hour.condition_code.ends_with('d'));
        }
    }

    #[test]
    fn mock_coordinates_are_valid() {
        let mut rng = rng();
        for _ in 0..100 {
            let c = mock_coordinates(&mut rng);
            assert!(Coordinates::new(c.lat, c.lon).is_some());
            assert_eq!((c.lat * 10_000.0).round() / 10_000.0, c.lat);
        }
    }

    #[test]
    fn mock_articles_reference_location() {
        let now = Utc::now();
        let articles = mock_articles(Some("Oslo"), now);

        assert_eq!(articles.len(), 2);
        assert!(articles[0].title.contains("Oslo"));
        assert_eq!(articles[0].id, "mock-article-1");
        assert_eq!(articles[1].raw_published_at.as_deref(), Some(now.to_rfc3339().as_str()));
        assert!(articles.iter().all(NewsItem::is_displayable));
    }

    #[test]
    fn mock_articles_without_location_use_region() {
        let articles = mock_articles(None, Utc::now());
        assert!(articles[0].title.contains("Region"));
        assert!(articles[0].description.contains("the region"));
    }

    #[test]
    fn weather_fact_comes_from_table() {
        let fact = weather_fact(&mut rng());
        assert!(FACTS.contains(&fact));
    }
}
