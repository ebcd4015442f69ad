use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Stations further than this from the requested location are not considered local.
pub const MAX_STATION_DISTANCE_KM: f64 = 100.0;

/// Hong Kong Observatory headquarters, Tsim Sha Tsui.
pub const HK_DEFAULT_LOCATION: Coordinate = Coordinate {
    latitude: 22.3019,
    longitude: 114.1742,
};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Expected coordinate as 'lat,lng', got '{s}'"))?;

        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid latitude '{lat}': {e}"))?;
        let longitude: f64 = lng
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid longitude '{lng}': {e}"))?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow::anyhow!("Coordinate out of range: {latitude},{longitude}"));
        }

        Ok(Self { latitude, longitude })
    }
}

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * h.sqrt().asin() * EARTH_RADIUS_KM
}

/// Item closest to `origin`, with its distance in km. Ties keep the earliest item.
pub fn nearest<'a, T, F>(
    items: impl IntoIterator<Item = &'a T>,
    origin: Coordinate,
    coord_of: F,
) -> Option<(&'a T, f64)>
where
    T: 'a,
    F: Fn(&T) -> Coordinate,
{
    items.into_iter().fold(None, |best, item| {
        let distance = haversine_km(origin, coord_of(item));
        match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((item, distance)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(HK_DEFAULT_LOCATION, HK_DEFAULT_LOCATION), 0.0);
    }

    #[test]
    fn observatory_to_airport_is_about_26km() {
        let airport = Coordinate::new(22.3094, 113.9219);
        let d = haversine_km(HK_DEFAULT_LOCATION, airport);
        assert!((25.0..27.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(22.2, 114.0);
        let b = Coordinate::new(22.5, 114.3);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn nearest_picks_minimum_and_keeps_first_on_tie() {
        let points = [
            Coordinate::new(22.5, 114.0),
            Coordinate::new(22.31, 114.17),
            Coordinate::new(22.31, 114.17),
        ];
        let (found, distance) = nearest(&points, HK_DEFAULT_LOCATION, |c| *c).unwrap();
        assert!(std::ptr::eq(found, &points[1]));
        assert!(distance < 2.0);
    }

    #[test]
    fn nearest_of_nothing_is_none() {
        let points: [Coordinate; 0] = [];
        assert!(nearest(&points, HK_DEFAULT_LOCATION, |c| *c).is_none());
    }

    #[test]
    fn parses_coordinate_pairs() {
        let c: Coordinate = " 22.28, 114.16 ".parse().unwrap();
        assert_eq!(c, Coordinate::new(22.28, 114.16));

        assert!("22.28".parse::<Coordinate>().is_err());
        assert!("abc,114".parse::<Coordinate>().is_err());
        assert!("95,114".parse::<Coordinate>().is_err());
    }
}
