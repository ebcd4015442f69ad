use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::geo::Coordinate;

/// Environment variable read by [`EnvGeolocator`].
pub const GPS_ENV_VAR: &str = "HKWEATHER_GPS";

/// Where the user wants weather for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LocationPreference {
    /// Ask the geolocation provider each time.
    Gps,
    Fixed(Coordinate),
}

/// Source of the device's current position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinate>;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinate);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinate> {
        Ok(self.0)
    }
}

/// Reads `lat,lng` from `HKWEATHER_GPS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvGeolocator;

#[async_trait]
impl Geolocator for EnvGeolocator {
    async fn locate(&self) -> Result<Coordinate> {
        let raw = std::env::var(GPS_ENV_VAR)
            .map_err(|_| anyhow!("No position available; set {GPS_ENV_VAR}=lat,lng"))?;
        raw.parse()
            .with_context(|| format!("Failed to parse {GPS_ENV_VAR}"))
    }
}

/// Turns the stored preference into a coordinate.
///
/// `None` means "use the default Hong Kong location", which is also what a failed GPS
/// lookup degrades to.
pub async fn resolve_location(
    preference: Option<LocationPreference>,
    geolocator: &dyn Geolocator,
) -> Option<Coordinate> {
    match preference {
        None => None,
        Some(LocationPreference::Fixed(coordinate)) => Some(coordinate),
        Some(LocationPreference::Gps) => match geolocator.locate().await {
            Ok(coordinate) => {
                debug!(%coordinate, "located device");
                Some(coordinate)
            }
            Err(err) => {
                warn!("geolocation failed, using default location: {err:#}");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenGeolocator;

    #[async_trait]
    impl Geolocator for BrokenGeolocator {
        async fn locate(&self) -> Result<Coordinate> {
            Err(anyhow!("no fix"))
        }
    }

    const HERE: Coordinate = Coordinate::new(22.28, 114.16);

    #[tokio::test]
    async fn no_preference_resolves_to_default() {
        assert_eq!(resolve_location(None, &FixedGeolocator(HERE)).await, None);
    }

    #[tokio::test]
    async fn fixed_preference_ignores_geolocator() {
        let pref = Some(LocationPreference::Fixed(HERE));
        assert_eq!(resolve_location(pref, &BrokenGeolocator).await, Some(HERE));
    }

    #[tokio::test]
    async fn gps_uses_geolocator() {
        let pref = Some(LocationPreference::Gps);
        assert_eq!(resolve_location(pref, &FixedGeolocator(HERE)).await, Some(HERE));
    }

    #[tokio::test]
    async fn gps_failure_degrades_to_default() {
        let pref = Some(LocationPreference::Gps);
        assert_eq!(resolve_location(pref, &BrokenGeolocator).await, None);
    }
}
