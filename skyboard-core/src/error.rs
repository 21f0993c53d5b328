use thiserror::Error;

use crate::provider::ProviderId;

/// Failure of a single upstream call.
///
/// Every variant is recoverable by the aggregators: they substitute mock data
/// (or an empty list) and log the error instead of surfacing it.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No usable credential (missing, empty or a placeholder).
    #[error("{provider} is not configured")]
    Unconfigured { provider: ProviderId },

    /// Transport failure, including timeouts.
    #[error("{provider} request failed: {message}")]
    Unavailable { provider: ProviderId, message: String },

    /// Non-2xx response.
    #[error("{provider} request failed with status {status}: {body}")]
    Http { provider: ProviderId, status: u16, body: String },

    /// The payload did not match the expected schema.
    #[error("Failed to parse {provider} response: {message}")]
    Parse { provider: ProviderId, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Unconfigured { provider }
            | Self::Unavailable { provider, .. }
            | Self::Http { provider, .. }
            | Self::Parse { provider, .. } => *provider,
        }
    }

    pub fn parse(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::Parse { provider, message: message.into() }
    }
}

/// The only failure `fetch_weather` propagates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeatherFetchError {
    #[error("Could not fetch weather for '{location}' (forced failure)")]
    ForcedFailure { location: String },
}

/// The only failure `resolve_location` propagates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Location query must not be empty")]
    EmptyQuery,
}
