//! Turns free text or a `"lat,lon"` pair into a [`LocationInfo`].
//!
//! Geocoding failures never surface: coordinate input keeps its coordinates
//! under [`CURRENT_LOCATION_NAME`], and text input is echoed back with random
//! coordinates so the rest of the dashboard can still render.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::{
    error::ResolveError,
    mock::mock_coordinates,
    model::{CURRENT_LOCATION_NAME, Coordinates, LocationInfo},
    normalize::title_case,
    provider::Geocoder,
};

/// Parses `"lat,lon"`. Anything else, including out-of-range pairs, is `None`.
pub fn parse_coordinates(input: &str) -> Option<Coordinates> {
    let (lat, lon) = input.split_once(',')?;
    if lon.contains(',') {
        return None;
    }

    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    Coordinates::new(lat, lon)
}

fn is_unknown_query(query: &str) -> bool {
    query.eq_ignore_ascii_case("unknown")
}

#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl LocationResolver {
    pub fn new(geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self { geocoder }
    }

    #[instrument(skip(self))]
    pub async fn resolve_location(&self, query: &str) -> Result<LocationInfo, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }

        if is_unknown_query(query) {
            return Ok(LocationInfo::unknown());
        }

        match parse_coordinates(query) {
            Some(coords) => Ok(self.resolve_coordinates(coords).await),
            None => Ok(self.resolve_text(query).await),
        }
    }

    async fn resolve_coordinates(&self, coords: Coordinates) -> LocationInfo {
        let fallback = || LocationInfo::new(CURRENT_LOCATION_NAME, coords);

        let Some(geocoder) = &self.geocoder else {
            debug!("No geocoder configured, labelling coordinates");
            return fallback();
        };

        match geocoder.reverse(coords).await {
            Ok(Some(place)) => {
                let name = place.display_name();
                if name.is_empty() { fallback() } else { LocationInfo::new(name, coords) }
            }
            Ok(None) => {
                info!(lat = coords.lat, lon = coords.lon, "Reverse geocoding found nothing");
                fallback()
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, labelling coordinates");
                fallback()
            }
        }
    }

    async fn resolve_text(&self, query: &str) -> LocationInfo {
        let Some(geocoder) = &self.geocoder else {
            debug!(%query, "No geocoder configured, using mock location");
            return mock_location(query);
        };

        match geocoder.forward(query).await {
            Ok(Some(place)) => match Coordinates::new(place.lat, place.lon) {
                Some(coords) => LocationInfo::new(place.display_name(), coords),
                None => {
                    warn!(%query, lat = place.lat, lon = place.lon, "Geocoder returned invalid coordinates");
                    mock_location(query)
                }
            },
            Ok(None) => {
                info!(%query, "No geocoding match");
                LocationInfo::unknown()
            }
            Err(e) => {
                warn!(%query, error = %e, "Geocoding failed, using mock location");
                mock_location(query)
            }
        }
    }
}

fn mock_location(query: &str) -> LocationInfo {
    let coords = mock_coordinates(&mut rand::thread_rng());
    LocationInfo::new(title_case(query), coords)
}
