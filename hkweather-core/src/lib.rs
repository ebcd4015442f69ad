//! Core library for the `hkweather` CLI.
//!
//! This crate defines:
//! - Settings (language, refresh rate, location preference)
//! - Clients for the Hong Kong Observatory open-data feeds
//! - Station tables and nearest-station resolution
//! - The aggregation that joins the feeds into one weather snapshot
//!
//! It is used by `hkweather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod geo;
pub mod http;
pub mod location;
pub mod model;
pub mod stations;

pub use aggregate::{StationResolution, WeatherService, resolve_stations};
pub use cache::{Snapshot, SnapshotCache};
pub use config::Config;
pub use error::DataError;
pub use feed::warnings::ActiveWarnings;
pub use geo::Coordinate;
pub use http::{Endpoints, HkoClient};
pub use location::{EnvGeolocator, FixedGeolocator, Geolocator, LocationPreference, resolve_location};
pub use model::{
    CurrentWeatherInfo, HourlyWeatherInfo, Language, LunarDate, TropicalCycloneInfo, WeatherInfo,
    WeatherStatusIcon, WeatherTip, WeatherWarningsType, Wind,
};
pub use stations::StationRegistry;
