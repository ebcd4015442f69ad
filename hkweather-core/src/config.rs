use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    geo::Coordinate,
    http::Endpoints,
    location::LocationPreference,
    model::Language,
};

/// 30 minutes, matching the tile refresh period.
pub const DEFAULT_REFRESH_RATE_MS: i64 = 1_800_000;

/// User settings stored on disk.
///
/// Example TOML:
/// ```toml
/// language = "en"
/// refresh_rate_ms = 900000
///
/// [location]
/// mode = "fixed"
/// latitude = 22.28
/// longitude = 114.16
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub language: Language,

    /// Milliseconds between refreshes; missing or negative means the default.
    pub refresh_rate_ms: Option<i64>,

    /// Directory with replacement station tables; the bundled ones are used otherwise.
    pub stations_dir: Option<PathBuf>,

    pub location: Option<LocationPreference>,

    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Config {
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn refresh_rate(&self) -> Duration {
        let ms = self
            .refresh_rate_ms
            .filter(|ms| *ms >= 0)
            .unwrap_or(DEFAULT_REFRESH_RATE_MS);
        Duration::from_millis(ms.unsigned_abs())
    }

    pub fn set_refresh_rate(&mut self, rate: Duration) {
        self.refresh_rate_ms = Some(i64::try_from(rate.as_millis()).unwrap_or(i64::MAX));
    }

    pub fn location_preference(&self) -> Option<LocationPreference> {
        self.location
    }

    pub fn set_location(&mut self, coordinate: Coordinate) {
        self.location = Some(LocationPreference::Fixed(coordinate));
    }

    pub fn set_location_gps(&mut self) {
        self.location = Some(LocationPreference::Gps);
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("hk", "hkweather", "hkweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let cfg = Config::default();

        assert_eq!(cfg.language(), Language::Zh);
        assert_eq!(cfg.refresh_rate(), Duration::from_secs(30 * 60));
        assert_eq!(cfg.location_preference(), None);
    }

    #[test]
    fn negative_refresh_rate_falls_back_to_default() {
        let cfg = Config {
            refresh_rate_ms: Some(-5),
            ..Config::default()
        };
        assert_eq!(cfg.refresh_rate(), Duration::from_millis(1_800_000));
    }

    #[test]
    fn location_setters() {
        let mut cfg = Config::default();

        cfg.set_location(Coordinate::new(22.28, 114.16));
        assert_eq!(
            cfg.location_preference(),
            Some(LocationPreference::Fixed(Coordinate::new(22.28, 114.16)))
        );

        cfg.set_location_gps();
        assert_eq!(cfg.location_preference(), Some(LocationPreference::Gps));

        cfg.clear_location();
        assert_eq!(cfg.location_preference(), None);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_language(Language::En);
        cfg.set_refresh_rate(Duration::from_secs(600));
        cfg.set_location(Coordinate::new(22.3, 114.2));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.language(), Language::En);
        assert_eq!(loaded.refresh_rate(), Duration::from_secs(600));
        assert_eq!(loaded.location_preference(), cfg.location_preference());
        assert_eq!(loaded.endpoints, Endpoints::default());
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.language(), Language::Zh);
    }

    #[test]
    fn parses_gps_location() {
        let cfg: Config = toml::from_str("language = \"en\"\n[location]\nmode = \"gps\"\n").unwrap();
        assert_eq!(cfg.location_preference(), Some(LocationPreference::Gps));
        assert_eq!(cfg.language(), Language::En);
    }
}
