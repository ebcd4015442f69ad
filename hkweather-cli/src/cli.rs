use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use hkweather_core::{
    Config, Coordinate, CurrentWeatherInfo, EnvGeolocator, Language, LocationPreference, Snapshot,
    SnapshotCache, StationResolution, WeatherService, resolve_location, resolve_stations,
};
use inquire::{CustomType, Select};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{future::Future, time::Duration};
use tracing::{debug, info};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "hkweather", version, about = "Hong Kong Observatory weather")]
pub struct Cli {
    /// More log output (-v, -vv, -vvv). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Change settings. Without flags, asks interactively.
    Configure {
        /// Display language: "en" or "zh".
        #[arg(long)]
        language: Option<Language>,

        /// Minutes before cached data is refetched.
        #[arg(long)]
        refresh_minutes: Option<u64>,

        /// Fixed location as "lat,lng".
        #[arg(long, conflicts_with_all = ["gps", "clear_location"])]
        location: Option<Coordinate>,

        /// Use the device position (HKWEATHER_GPS="lat,lng").
        #[arg(long, conflicts_with = "clear_location")]
        gps: bool,

        /// Forget the location and use the Hong Kong Observatory.
        #[arg(long)]
        clear_location: bool,
    },

    /// Current conditions and forecast for the configured location.
    Current {
        #[arg(long)]
        json: bool,

        /// Ignore cached data.
        #[arg(long)]
        refresh: bool,
    },

    /// Weather warnings in force.
    Warnings {
        #[arg(long)]
        json: bool,

        #[arg(long)]
        refresh: bool,
    },

    /// Special weather tips.
    Tips {
        #[arg(long)]
        json: bool,

        #[arg(long)]
        refresh: bool,
    },

    /// Tropical cyclones being tracked.
    Cyclones {
        #[arg(long)]
        json: bool,
    },

    /// Lunar calendar date.
    Lunar {
        /// YYYY-MM-DD; if absent, today in Hong Kong.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Nearest stations to a location.
    Stations {
        /// "lat,lng"; if absent, the configured location.
        #[arg(long)]
        near: Option<Coordinate>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure {
                language,
                refresh_minutes,
                location,
                gps,
                clear_location,
            } => {
                let interactive = language.is_none()
                    && refresh_minutes.is_none()
                    && location.is_none()
                    && !gps
                    && !clear_location;

                if interactive {
                    configure_interactive(&mut config)?;
                } else {
                    if let Some(language) = language {
                        config.set_language(language);
                    }
                    if let Some(minutes) = refresh_minutes {
                        config.set_refresh_rate(from_minutes(minutes));
                    }
                    if let Some(coordinate) = location {
                        config.set_location(coordinate);
                    }
                    if gps {
                        config.set_location_gps();
                    }
                    if clear_location {
                        config.clear_location();
                    }
                }

                config.save()?;
                invalidate_cache()?;
                println!("Saved {}", Config::config_file_path()?.display());
            }
            Command::Current { json, refresh } => {
                let service = WeatherService::from_config(&config)?;
                let lang = service.language();
                let location = resolve_location(config.location_preference(), &EnvGeolocator).await;
                let stations = &resolve_stations(service.stations(), location, lang)?;
                let service = &service;

                let snapshot = cached(
                    &SnapshotCache::default_location()?,
                    &format!("current-{lang}"),
                    config.refresh_rate(),
                    refresh,
                    |cached: &CurrentSnapshot| cached.stations == *stations,
                    move || async move {
                        Ok(CurrentSnapshot {
                            stations: stations.clone(),
                            info: service.current_weather_info(location).await?,
                        })
                    },
                )
                .await?;

                let info = &snapshot.value.info;
                if json {
                    print_json(info)?;
                } else {
                    print!("{}", render::Current(info, lang));
                }
            }
            Command::Warnings { json, refresh } => {
                let service = WeatherService::from_config(&config)?;
                let lang = service.language();
                let snapshot = cached(
                    &SnapshotCache::default_location()?,
                    &format!("warnings-{lang}"),
                    config.refresh_rate(),
                    refresh,
                    |_| true,
                    || service.active_warnings(),
                )
                .await?;

                if json {
                    print_json(&snapshot.value)?;
                } else {
                    print!("{}", render::Warnings(&snapshot.value, lang));
                }
            }
            Command::Tips { json, refresh } => {
                let service = WeatherService::from_config(&config)?;
                let lang = service.language();
                let snapshot = cached(
                    &SnapshotCache::default_location()?,
                    &format!("tips-{lang}"),
                    config.refresh_rate(),
                    refresh,
                    |_| true,
                    || service.weather_tips(),
                )
                .await?;

                if json {
                    print_json(&snapshot.value)?;
                } else {
                    print!("{}", render::Tips(&snapshot.value, lang));
                }
            }
            Command::Cyclones { json } => {
                let service = WeatherService::from_config(&config)?;
                let cyclones = service.tropical_cyclones().await?;

                if json {
                    print_json(&cyclones)?;
                } else {
                    print!("{}", render::Cyclones(&cyclones, service.language()));
                }
            }
            Command::Lunar { date, json } => {
                let service = WeatherService::from_config(&config)?;
                let date = date.unwrap_or_else(|| service.today());
                let lunar = service.lunar_date(date).await?;

                if json {
                    print_json(&lunar)?;
                } else {
                    println!("{date}: {lunar}");
                }
            }
            Command::Stations { near } => {
                let service = WeatherService::from_config(&config)?;
                let origin = match near {
                    Some(c) => Some(c),
                    None => resolve_location(config.location_preference(), &EnvGeolocator).await,
                };
                print!("{}", render::Stations(service.stations(), origin, service.language()));
            }
        }

        Ok(())
    }
}

/// The `current` snapshot with the stations it was built for.
#[derive(Debug, Serialize, Deserialize)]
struct CurrentSnapshot {
    stations: StationResolution,
    info: CurrentWeatherInfo,
}

fn from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Returns the cached snapshot while it is fresh and `accept`ed, otherwise fetches and
/// stores a new one.
async fn cached<T, A, F, Fut>(
    cache: &SnapshotCache,
    name: &str,
    refresh_rate: Duration,
    force: bool,
    accept: A,
    fetch: F,
) -> anyhow::Result<Snapshot<T>>
where
    T: Serialize + DeserializeOwned,
    A: Fn(&T) -> bool,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let fresh = (!force)
        .then(|| cache.load::<T>(name))
        .flatten()
        .filter(|snapshot| snapshot.is_fresh(Utc::now(), refresh_rate) && accept(&snapshot.value));
    if let Some(snapshot) = fresh {
        debug!(name, fetched_at = %snapshot.fetched_at, "using cached snapshot");
        return Ok(snapshot);
    }

    let snapshot = Snapshot::new(fetch().await?);
    cache.store(name, &snapshot)?;
    info!(name, "fetched new snapshot");
    Ok(snapshot)
}

/// Settings changes make every cached snapshot stale.
fn invalidate_cache() -> anyhow::Result<()> {
    let cache = SnapshotCache::default_location()?;
    for feed in ["current", "warnings", "tips"] {
        for lang in [Language::En, Language::Zh] {
            cache.clear(&format!("{feed}-{lang}"))?;
        }
    }
    Ok(())
}

fn configure_interactive(config: &mut Config) -> anyhow::Result<()> {
    let languages = vec![Language::Zh, Language::En];
    let start = languages
        .iter()
        .position(|l| *l == config.language())
        .unwrap_or(0);
    let language = Select::new("Language:", languages)
        .with_starting_cursor(start)
        .prompt()
        .context("Language prompt aborted")?;
    config.set_language(language);

    let minutes = CustomType::<u64>::new("Refresh every (minutes):")
        .with_default(config.refresh_rate().as_secs() / 60)
        .with_error_message("Please enter a whole number of minutes")
        .prompt()
        .context("Refresh rate prompt aborted")?;
    config.set_refresh_rate(from_minutes(minutes));

    const DEFAULT: &str = "Hong Kong Observatory (default)";
    const GPS: &str = "Device position (GPS)";
    const FIXED: &str = "Fixed coordinate";
    let current = match config.location_preference() {
        None => 0,
        Some(LocationPreference::Gps) => 1,
        Some(LocationPreference::Fixed(_)) => 2,
    };
    let mode = Select::new("Location:", vec![DEFAULT, GPS, FIXED])
        .with_starting_cursor(current)
        .prompt()
        .context("Location prompt aborted")?;

    match mode {
        GPS => config.set_location_gps(),
        FIXED => {
            let coordinate = CustomType::<Coordinate>::new("Coordinate (lat,lng):")
                .with_error_message("Please enter a coordinate such as 22.28,114.16")
                .prompt()
                .context("Coordinate prompt aborted")?;
            config.set_location(coordinate);
        }
        _ => config.clear_location(),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
