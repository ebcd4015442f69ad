//! Joins the individual feeds into the composite snapshot shown on the watch tiles.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::DataError,
    feed::{
        astronomy, cyclone,
        forecast::{self, StationForecast},
        lunar,
        regional::{self, Columns, Element},
        report::{self, CurrentReport},
        tips,
        warnings::{self, ActiveWarnings},
    },
    geo::{Coordinate, HK_DEFAULT_LOCATION, MAX_STATION_DISTANCE_KM},
    http::{CsvTable, HkoClient},
    model::{
        CurrentWeatherInfo, HourlyWeatherInfo, Language, LunarDate, MoonTimes, SunTimes,
        TropicalCycloneInfo, WeatherInfo, WeatherStatusIcon, WeatherTip, hk_today,
    },
    stations::StationRegistry,
};

/// Which station feeds each part of the snapshot for a given location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationResolution {
    /// Name shown to the user.
    pub display_name: String,
    /// Temperature station whose row is used; `None` when no station is close enough.
    pub temperature_station: Option<String>,
    pub humidity_station: Option<String>,
    pub wind_station: Option<String>,
    /// OCF grid point id.
    pub forecast_station: String,
}

/// Picks the stations for `location` (the Observatory when `None`).
pub fn resolve_stations(
    registry: &StationRegistry,
    location: Option<Coordinate>,
    lang: Language,
) -> Result<StationResolution> {
    let (origin, mut display_name) = match location {
        Some(coordinate) => (coordinate, None),
        None => (HK_DEFAULT_LOCATION, Some(lang.hong_kong().to_string())),
    };

    let (nearest, distance) = registry
        .nearest_temperature(origin)
        .ok_or_else(|| anyhow!("No temperature stations loaded"))?;

    let temperature_station = if distance > MAX_STATION_DISTANCE_KM {
        display_name = Some(lang.hong_kong().to_string());
        None
    } else {
        let name = nearest.name(lang).to_string();
        display_name.get_or_insert_with(|| name.clone());
        Some(name)
    };

    let humidity_station = registry
        .nearest_humidity(origin)
        .map(|(s, _)| s.name(lang).to_string());
    let wind_station = registry
        .nearest_wind(origin)
        .map(|(s, _)| s.name(lang).to_string());
    let forecast_station = registry
        .nearest_forecast(origin)
        .map(|(s, _)| s.id.clone())
        .ok_or_else(|| anyhow!("No forecast stations loaded"))?;

    let resolution = StationResolution {
        display_name: display_name.unwrap_or_else(|| lang.hong_kong().to_string()),
        temperature_station,
        humidity_station,
        wind_station,
        forecast_station,
    };
    debug!(?origin, distance, ?resolution, "resolved stations");

    Ok(resolution)
}

/// Raw feed payloads for one snapshot.
#[derive(Debug, Clone)]
pub struct Feeds {
    pub temperature: CsvTable,
    pub humidity: CsvTable,
    pub wind: CsvTable,
    pub report: CurrentReport,
    pub station_forecast: StationForecast,
    pub nine_day: Vec<WeatherInfo>,
    pub sun: SunTimes,
    pub moon: MoonTimes,
}

/// Joins the feeds for the resolved stations.
pub fn assemble(
    stations: &StationResolution,
    feeds: Feeds,
    lang: Language,
    today: NaiveDate,
) -> Result<CurrentWeatherInfo> {
    let cols = Columns::for_language(lang);

    let current_temperature = regional::row_or_observatory(
        &feeds.temperature,
        lang,
        stations.temperature_station.as_deref(),
    )
    .ok_or_else(|| DataError::NoStationRecord(cols.observatory.to_string()))
    .context("No temperature reading")?
    .number(cols.temperature);

    let current_humidity =
        regional::row_or_observatory(&feeds.humidity, lang, stations.humidity_station.as_deref())
            .ok_or_else(|| DataError::NoStationRecord(cols.observatory.to_string()))
            .context("No humidity reading")?
            .number(cols.humidity);

    let wind = regional::wind_at(&feeds.wind, lang, stations.wind_station.as_deref());
    if wind.is_none() {
        warn!(station = ?stations.wind_station, "no wind reading available");
    }

    let first_day = feeds
        .nine_day
        .first()
        .ok_or(DataError::Missing("weatherForecast"))
        .context("9-day forecast is empty")?;

    let today_info = WeatherInfo {
        date: today,
        highest_temperature: first_day.highest_temperature,
        lowest_temperature: first_day.lowest_temperature,
        max_relative_humidity: first_day.max_relative_humidity,
        min_relative_humidity: first_day.min_relative_humidity,
        chance_of_rain: feeds
            .station_forecast
            .daily
            .first()
            .and_then(|d| d.chance_of_rain),
        weather_icon: feeds.report.icon,
    };

    let forecast = feeds
        .nine_day
        .iter()
        .map(|day| WeatherInfo {
            chance_of_rain: feeds.station_forecast.chance_of_rain_on(day.date),
            ..day.clone()
        })
        .collect();

    let mut last_icon = feeds.report.icon;
    let hourly = feeds
        .station_forecast
        .hourly
        .iter()
        .map(|hour| {
            if let Some(icon) = hour.weather_code.and_then(WeatherStatusIcon::from_code) {
                last_icon = Some(icon);
            }
            HourlyWeatherInfo {
                time: hour.time,
                temperature: hour.temperature,
                humidity: hour.humidity,
                wind_direction: hour.wind_direction,
                wind_speed: hour.wind_speed,
                weather_icon: last_icon,
            }
        })
        .collect();

    Ok(CurrentWeatherInfo {
        today: today_info,
        weather_station: stations.display_name.clone(),
        current_temperature,
        current_humidity,
        uv_index: feeds.report.uv_index,
        wind,
        sun: feeds.sun,
        moon: feeds.moon,
        forecast,
        hourly,
    })
}

/// Entry point for everything the app displays.
#[derive(Debug, Clone)]
pub struct WeatherService {
    client: HkoClient,
    stations: StationRegistry,
    language: Language,
    today: Option<NaiveDate>,
}

impl WeatherService {
    pub fn new(client: HkoClient, stations: StationRegistry, language: Language) -> Self {
        Self {
            client,
            stations,
            language,
            today: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HkoClient::new(config.endpoints.clone())?;
        let stations = match &config.stations_dir {
            Some(dir) => StationRegistry::from_dir(dir)?,
            None => StationRegistry::bundled()?,
        };
        Ok(Self::new(client, stations, config.language()))
    }

    /// Pins "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn stations(&self) -> &StationRegistry {
        &self.stations
    }

    /// Today in Hong Kong.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(hk_today)
    }

    pub async fn current_weather_info(&self, location: Option<Coordinate>) -> Result<CurrentWeatherInfo> {
        let lang = self.language;
        let today = self.today();
        let stations = resolve_stations(&self.stations, location, lang)?;
        let client = &self.client;

        let (temperature, humidity, wind, report, station_forecast, nine_day, sun, moon) = tokio::try_join!(
            regional::fetch(client, Element::Temperature, lang),
            regional::fetch(client, Element::Humidity, lang),
            regional::fetch(client, Element::Wind, lang),
            report::current_report(client, lang),
            forecast::station_forecast(client, &stations.forecast_station),
            forecast::nine_day_forecast(client, lang),
            astronomy::sun_times(client, today),
            astronomy::moon_times(client, today),
        )?;

        let feeds = Feeds {
            temperature,
            humidity,
            wind,
            report,
            station_forecast,
            nine_day,
            sun,
            moon,
        };

        assemble(&stations, feeds, lang, today)
    }

    /// Lunar date; the solar term is only looked up for today.
    pub async fn lunar_date(&self, date: NaiveDate) -> Result<LunarDate> {
        if date != self.today() {
            return lunar::lunar_date(&self.client, date).await;
        }

        let (lunar, term) = tokio::join!(
            lunar::lunar_date(&self.client, date),
            lunar::solar_term(&self.client),
        );

        let mut lunar = lunar?;
        lunar.climatology = term.unwrap_or_else(|err| {
            warn!("solar term unavailable: {err:#}");
            None
        });
        Ok(lunar)
    }

    pub async fn active_warnings(&self) -> Result<ActiveWarnings> {
        warnings::active_warnings(&self.client, self.language).await
    }

    pub async fn weather_tips(&self) -> Result<Vec<WeatherTip>> {
        tips::weather_tips(&self.client, self.language).await
    }

    pub async fn tropical_cyclones(&self) -> Result<Vec<TropicalCycloneInfo>> {
        cyclone::tropical_cyclones(&self.client).await
    }
}
