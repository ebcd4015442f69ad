//! Station tables used for nearest-station resolution.
//!
//! The regional tables are the HKO GeoJSON layers behind the "latest readings" maps;
//! the forecast table maps location-specific forecast ids to their grid points.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::debug;

use crate::{
    geo::{Coordinate, nearest},
    model::Language,
};

pub const TEMPERATURE_FILE: &str = "latest_1min_temperature.json";
pub const HUMIDITY_FILE: &str = "latest_1min_humidity.json";
pub const WIND_FILE: &str = "latest_10min_wind.json";
pub const FORECAST_FILE: &str = "forecast_stations.json";

/// An automatic weather station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name_en: String,
    pub name_zh: String,
    pub coordinate: Coordinate,
}

impl Station {
    pub fn name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.name_en,
            Language::Zh => &self.name_zh,
        }
    }
}

/// A location-specific forecast grid point, e.g. `"SHA"` for Sha Tin.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStation {
    pub id: String,
    pub coordinate: Coordinate,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[longitude, latitude]`
    coordinates: (f64, f64),
}

#[derive(Debug, Deserialize)]
struct StationProperties {
    #[serde(rename = "AutomaticWeatherStation_en")]
    name_en: String,
    #[serde(rename = "AutomaticWeatherStation_uc")]
    name_zh: String,
}

#[derive(Debug, Deserialize)]
struct ForecastStationsFile {
    /// id -> `[latitude, longitude]`
    stations: BTreeMap<String, (f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSet {
    stations: Vec<Station>,
}

impl StationSet {
    pub fn from_geojson(json: &str) -> Result<Self> {
        let parsed: FeatureCollection =
            serde_json::from_str(json).context("Failed to parse station GeoJSON")?;

        let stations = parsed
            .features
            .into_iter()
            .map(|f| Station {
                name_en: f.properties.name_en,
                name_zh: f.properties.name_zh,
                coordinate: Coordinate::new(f.geometry.coordinates.1, f.geometry.coordinates.0),
            })
            .collect();

        Ok(Self { stations })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn nearest(&self, origin: Coordinate) -> Option<(&Station, f64)> {
        nearest(&self.stations, origin, |s| s.coordinate)
    }
}

pub fn parse_forecast_stations(json: &str) -> Result<Vec<ForecastStation>> {
    let parsed: ForecastStationsFile =
        serde_json::from_str(json).context("Failed to parse forecast station list")?;

    Ok(parsed
        .stations
        .into_iter()
        .map(|(id, (lat, lng))| ForecastStation {
            id,
            coordinate: Coordinate::new(lat, lng),
        })
        .collect())
}

/// Every station table the aggregation needs.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    pub temperature: StationSet,
    pub humidity: StationSet,
    pub wind: StationSet,
    pub forecast: Vec<ForecastStation>,
}

impl StationRegistry {
    /// Tables shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_sources(
            include_str!("../data/latest_1min_temperature.json"),
            include_str!("../data/latest_1min_humidity.json"),
            include_str!("../data/latest_10min_wind.json"),
            include_str!("../data/forecast_stations.json"),
        )
    }

    /// Loads the four tables from `dir`, using the same file names as the bundled set.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read station table: {}", path.display()))
        };

        Self::from_sources(
            &read(TEMPERATURE_FILE)?,
            &read(HUMIDITY_FILE)?,
            &read(WIND_FILE)?,
            &read(FORECAST_FILE)?,
        )
    }

    fn from_sources(temperature: &str, humidity: &str, wind: &str, forecast: &str) -> Result<Self> {
        let registry = Self {
            temperature: StationSet::from_geojson(temperature).context("temperature stations")?,
            humidity: StationSet::from_geojson(humidity).context("humidity stations")?,
            wind: StationSet::from_geojson(wind).context("wind stations")?,
            forecast: parse_forecast_stations(forecast)?,
        };

        debug!(
            temperature = registry.temperature.len(),
            humidity = registry.humidity.len(),
            wind = registry.wind.len(),
            forecast = registry.forecast.len(),
            "loaded station tables"
        );

        Ok(registry)
    }

    pub fn nearest_temperature(&self, origin: Coordinate) -> Option<(&Station, f64)> {
        self.temperature.nearest(origin)
    }

    pub fn nearest_humidity(&self, origin: Coordinate) -> Option<(&Station, f64)> {
        self.humidity.nearest(origin)
    }

    pub fn nearest_wind(&self, origin: Coordinate) -> Option<(&Station, f64)> {
        self.wind.nearest(origin)
    }

    pub fn nearest_forecast(&self, origin: Coordinate) -> Option<(&ForecastStation, f64)> {
        nearest(&self.forecast, origin, |s| s.coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::HK_DEFAULT_LOCATION;

    #[test]
    fn bundled_tables_load() {
        let registry = StationRegistry::bundled().unwrap();
        assert!(!registry.temperature.is_empty());
        assert!(!registry.humidity.is_empty());
        assert!(!registry.wind.is_empty());
        assert!(!registry.forecast.is_empty());
    }

    #[test]
    fn geojson_coordinates_are_lng_lat() {
        let json = r#"{"features":[{"geometry":{"coordinates":[114.21,22.4025]},
            "properties":{"AutomaticWeatherStation_en":"Sha Tin","AutomaticWeatherStation_uc":"沙田"}}]}"#;
        let set = StationSet::from_geojson(json).unwrap();
        let station = set.iter().next().unwrap();

        assert_eq!(station.coordinate, Coordinate::new(22.4025, 114.21));
        assert_eq!(station.name(Language::Zh), "沙田");
        assert_eq!(station.name(Language::En), "Sha Tin");
    }

    #[test]
    fn observatory_is_its_own_nearest_station() {
        let registry = StationRegistry::bundled().unwrap();
        let (station, distance) = registry.nearest_temperature(HK_DEFAULT_LOCATION).unwrap();
        assert_eq!(station.name_en, "Hong Kong Observatory");
        assert!(distance < 0.01);

        let (forecast, _) = registry.nearest_forecast(HK_DEFAULT_LOCATION).unwrap();
        assert_eq!(forecast.id, "HKO");
    }

    #[test]
    fn sha_tin_resolves_locally() {
        let registry = StationRegistry::bundled().unwrap();
        let here = Coordinate::new(22.3830, 114.1880);

        let (station, distance) = registry.nearest_temperature(here).unwrap();
        assert_eq!(station.name_en, "Sha Tin");
        assert!(distance < 5.0);

        let (wind, _) = registry.nearest_wind(here).unwrap();
        assert_eq!(wind.name_en, "Sha Tin");
    }

    #[test]
    fn from_dir_reads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let geojson = r#"{"features":[{"geometry":{"coordinates":[114.1742,22.3019]},
            "properties":{"AutomaticWeatherStation_en":"Hong Kong Observatory","AutomaticWeatherStation_uc":"天文台"}}]}"#;
        for name in [TEMPERATURE_FILE, HUMIDITY_FILE, WIND_FILE] {
            fs::write(dir.path().join(name), geojson).unwrap();
        }
        fs::write(dir.path().join(FORECAST_FILE), r#"{"stations":{"HKO":[22.3019,114.1742]}}"#).unwrap();

        let registry = StationRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(registry.temperature.len(), 1);
        assert_eq!(registry.forecast[0].id, "HKO");
    }

    #[test]
    fn from_dir_fails_on_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let err = StationRegistry::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read station table"));
    }
}
