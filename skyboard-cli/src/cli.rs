use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use skyboard_core::{
    Config, LocationInfo, NewsItem, ProviderId, Skyboard, WeatherData, mock::weather_fact,
};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyboard", version, about = "Weather and news dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "openweather", "metno", "newsapi" or "youtube".
        provider: String,

        /// Override the provider endpoint, e.g. for a proxy.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show weather for a place name or "lat,lon".
    Show {
        /// Location query; falls back to the stored default location.
        query: Option<String>,

        /// Print the raw data as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the merged news and video feed.
    News {
        /// Search keywords.
        keywords: Vec<String>,

        /// Location name added to the search.
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Evaluate the configured alert rules for a location.
    Alerts {
        query: Option<String>,
    },

    /// Store the location used when no query is given.
    SetDefault {
        query: String,
    },

    /// Print a random weather fact.
    Fact,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { provider, base_url } => configure(&mut config, &provider, base_url),
            Command::Show { query, json } => {
                let board = Skyboard::from_config(&config)?;
                let query = query_or_default(query, &config)?;

                let location = board.resolve_location(&query).await?;
                let weather = board.fetch_weather(&location).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&weather)?);
                } else {
                    print_weather(&location, &weather);
                }
                Ok(())
            }
            Command::News { keywords, location, json } => {
                let board = Skyboard::from_config(&config)?;
                let location = location.or_else(|| config.default_location.clone());
                let feed = board.fetch_news(&keywords, location.as_deref()).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&feed)?);
                } else {
                    print_feed(&feed);
                }
                Ok(())
            }
            Command::Alerts { query } => {
                let board = Skyboard::from_config(&config)?;
                let query = query_or_default(query, &config)?;

                if !config.alerts.iter().any(|p| p.enabled) {
                    let path = Config::config_file_path()?;
                    println!("No alert rules are enabled. Edit {}", path.display());
                    return Ok(());
                }

                let (location, alerts) = board.alerts_for(&query, &config.alerts).await?;
                if alerts.is_empty() {
                    println!("No alerts for {}.", location.name);
                } else {
                    println!("Alerts for {}:", location.name);
                    for alert in alerts {
                        println!("  ! {alert}");
                    }
                }
                Ok(())
            }
            Command::SetDefault { query } => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(anyhow!("Default location must not be empty"));
                }
                config.default_location = Some(query.to_string());
                config.save()?;
                println!("Default location set to '{query}'.");
                Ok(())
            }
            Command::Fact => {
                println!("{}", weather_fact(&mut rand::thread_rng()));
                Ok(())
            }
        }
    }
}

fn query_or_default(query: Option<String>, config: &Config) -> Result<String> {
    query
        .or_else(|| config.default_location.clone())
        .context("No location given and no default location stored. Run `skyboard set-default <query>`.")
}

fn configure(config: &mut Config, provider: &str, base_url: Option<String>) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    debug!(provider = %id, "Configuring provider");

    if id.requires_api_key() {
        let key = Password::new(&format!("{id} API key:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;

        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("API key must not be empty"));
        }
        config.upsert_provider_api_key(id, key.to_string());
    }

    if let Some(url) = base_url {
        config.set_provider_base_url(id, url);
    }

    if id.is_weather_provider() {
        let make_default = Confirm::new(&format!("Use {id} for weather?"))
            .with_default(config.weather_provider_id().ok() == Some(id))
            .prompt()
            .context("Failed to read answer")?;

        if make_default {
            config.set_weather_provider(id)?;
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_weather(location: &LocationInfo, weather: &WeatherData) {
    let current = &weather.current;

    println!("{}", location.name);
    if let (Some(lat), Some(lon)) = (location.lat, location.lon) {
        println!("  ({lat:.4}, {lon:.4})");
    }
    println!("  {}", current.observation_time);
    println!();
    println!("  {}°C  {}", current.temp, current.description);
    println!(
        "  Feels like {}°C, humidity {}%, wind {} km/h, UV {}",
        current.feels_like, current.humidity, current.wind_speed, current.uv_index
    );

    if !current.sunrise.is_empty() {
        println!("  Sunrise {}, sunset {}", current.sunrise, current.sunset);
    }
    if let Some(aqi) = current.aqi {
        println!("  Air quality index {aqi} (approximate)");
    }
    if let Some(pollen) = current.pollen_count {
        println!("  Pollen {pollen}/5");
    }

    println!();
    let hourly: Vec<String> =
        weather.hourly.iter().take(8).map(|h| format!("{} {}°", h.time, h.temp)).collect();
    println!("  Next hours: {}", hourly.join("  "));

    println!();
    for day in &weather.daily {
        println!(
            "  {:<10} {:>4}° / {:>4}°  {}",
            day.day_name, day.high_temp, day.low_temp, day.description
        );
    }
}

fn print_feed(feed: &[NewsItem]) {
    if feed.is_empty() {
        println!("No news found.");
        return;
    }

    for item in feed {
        let kind = if item.is_video() { "video" } else { "article" };
        println!("[{kind}] {}", item.title);
        println!("    {} | {}", item.source, item.published_at);
        println!("    {}", item.url);
    }
}
