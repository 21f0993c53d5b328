//! Core library for the `skyboard` weather dashboard.
//!
//! This crate defines:
//! - Location resolution (geocoding, coordinate input, sentinels)
//! - Weather aggregation over OpenWeather or MET Norway, with mock fallback
//! - A merged news/video feed
//! - Configuration, alert rules and shared domain models
//!
//! It is used by `skyboard-cli`, but can also be reused by other binaries or services.

pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod mock;
pub mod model;
pub mod news;
pub mod normalize;
pub mod provider;
pub mod weather;

pub use alerts::{default_alert_preferences, evaluate_alerts};
pub use config::{Config, ProviderConfig};
pub use dashboard::Skyboard;
pub use error::{ProviderError, ResolveError, WeatherFetchError};
pub use location::LocationResolver;
pub use model::{LocationInfo, NewsItem, WeatherAlertPreference, WeatherData};
pub use news::NewsAggregator;
pub use provider::{Geocoder, NewsSource, ProviderId, WeatherProvider};
pub use weather::WeatherAggregator;
