use std::sync::Arc;

use chrono::Local;
use tracing::{debug, instrument, warn};

use crate::{
    error::WeatherFetchError,
    mock::mock_weather,
    model::{LocationInfo, WeatherData},
    provider::WeatherProvider,
};

/// A location with this name always fails. Used to exercise error states.
pub const FORCED_FAILURE_NAME: &str = "error";

/// Picks live or mock weather for a resolved location.
#[derive(Debug, Clone, Default)]
pub struct WeatherAggregator {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl WeatherAggregator {
    pub fn new(provider: Option<Arc<dyn WeatherProvider>>) -> Self {
        Self { provider }
    }

    /// Only the forced-failure location is an error; every other problem
    /// degrades to mock data under the requested name.
    #[instrument(skip(self, location), fields(location = %location.name))]
    pub async fn fetch_weather(
        &self,
        location: &LocationInfo,
    ) -> Result<WeatherData, WeatherFetchError> {
        let name = location.name.as_str();

        if name.trim().eq_ignore_ascii_case(FORCED_FAILURE_NAME) {
            return Err(WeatherFetchError::ForcedFailure { location: name.to_string() });
        }

        let Some(coords) = location.coordinates() else {
            debug!("No usable coordinates, using mock weather");
            return Ok(mock(name));
        };

        let Some(provider) = &self.provider else {
            debug!("No weather provider configured, using mock weather");
            return Ok(mock(name));
        };

        match provider.get_weather(coords, name).await {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!(provider = %provider.id(), error = %e, "Weather request failed, using mock data");
                Ok(mock(name))
            }
        }
    }
}

fn mock(location_name: &str) -> WeatherData {
    mock_weather(&mut rand::thread_rng(), location_name, Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ProviderError,
        mock::{HOURLY_POINTS, MOCK_DAILY_DAYS},
        model::Coordinates,
        provider::ProviderId,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for FailingProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn get_weather(
            &self,
            _coords: Coordinates,
            _location_name: &str,
        ) -> Result<WeatherData, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Http {
                provider: ProviderId::OpenWeather,
                status: 500,
                body: String::new(),
            })
        }
    }

    fn failing() -> (Arc<FailingProvider>, WeatherAggregator) {
        let provider = Arc::new(FailingProvider { calls: AtomicUsize::new(0) });
        let aggregator = WeatherAggregator::new(Some(provider.clone() as Arc<dyn WeatherProvider>));
        (provider, aggregator)
    }

    fn assert_mock_shape(data: &WeatherData, name: &str) {
        assert_eq!(data.current.location_name, name);
        assert_eq!(data.hourly.len(), HOURLY_POINTS);
        assert_eq!(data.daily.len(), MOCK_DAILY_DAYS);
    }

    #[tokio::test]
    async fn forced_failure_skips_provider() {
        let (provider, aggregator) = failing();
        let loc = LocationInfo::new("Error", Coordinates { lat: 1.0, lon: 1.0 });

        let err = aggregator.fetch_weather(&loc).await.unwrap_err();
        assert_eq!(err, WeatherFetchError::ForcedFailure { location: "Error".into() });
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_coordinates_never_call_provider() {
        let (provider, aggregator) = failing();
        let loc = LocationInfo::named("Nowhere");

        let data = aggregator.fetch_weather(&loc).await.unwrap();
        assert_mock_shape(&data, "Nowhere");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_mock() {
        let (provider, aggregator) = failing();
        let loc = LocationInfo::new("Oslo, NO", Coordinates { lat: 59.91, lon: 10.75 });

        let data = aggregator.fetch_weather(&loc).await.unwrap();
        assert_mock_shape(&data, "Oslo, NO");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unconfigured_provider_uses_mock() {
        let loc = LocationInfo::new("Lima", Coordinates { lat: -12.05, lon: -77.04 });
        let data = WeatherAggregator::default().fetch_weather(&loc).await.unwrap();
        assert_mock_shape(&data, "Lima");
    }
}
