//! Latest readings from the automatic weather station network, one CSV per element.

use anyhow::Result;

use crate::{
    http::{CsvRow, CsvTable, HkoClient},
    model::{Language, Wind},
};

const BASE_PATH: &str = "/weatherAPI/hko_data/regional-weather";

/// Value in the wind direction column when a station reports no wind.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Temperature,
    Humidity,
    Wind,
}

impl Element {
    fn file_stem(&self) -> &'static str {
        match self {
            Element::Temperature => "latest_1min_temperature",
            Element::Humidity => "latest_1min_humidity",
            Element::Wind => "latest_10min_wind",
        }
    }

    pub fn path(&self, lang: Language) -> String {
        format!("{BASE_PATH}/{}{}.csv", self.file_stem(), lang.csv_suffix())
    }
}

/// Localized CSV column captions.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub station: &'static str,
    pub temperature: &'static str,
    pub humidity: &'static str,
    pub wind_direction: &'static str,
    pub wind_speed: &'static str,
    pub gust: &'static str,
    /// Fallback row for temperature and humidity.
    pub observatory: &'static str,
    /// Fallback row for wind.
    pub star_ferry: &'static str,
}

impl Columns {
    pub fn for_language(lang: Language) -> Self {
        match lang {
            Language::En => Columns {
                station: "Automatic Weather Station",
                temperature: "Air Temperature(degree Celsius)",
                humidity: "Relative Humidity(percent)",
                wind_direction: "10-Minute Mean Wind Direction(Compass points)",
                wind_speed: "10-Minute Mean Speed(km/hour)",
                gust: "10-Minute Maximum Gust(km/hour)",
                observatory: "Hong Kong Observatory",
                star_ferry: "Star Ferry",
            },
            Language::Zh => Columns {
                station: "自動氣象站",
                temperature: "氣溫（攝氏）",
                humidity: "相對濕度（百分比）",
                wind_direction: "十分鐘平均風向（方位點）",
                wind_speed: "十分鐘平均風速（公里/小時）",
                gust: "十分鐘最高陣風風速（公里/小時）",
                observatory: "天文台",
                star_ferry: "天星碼頭",
            },
        }
    }
}

pub async fn fetch(client: &HkoClient, element: Element, lang: Language) -> Result<CsvTable> {
    let url = format!("{}{}", client.endpoints().data, element.path(lang));
    client.get_csv(&url, &[], None).await
}

/// Row for `station`, or the Observatory's when that station has no row.
pub fn row_or_observatory<'a>(
    table: &'a CsvTable,
    lang: Language,
    station: Option<&str>,
) -> Option<CsvRow<'a>> {
    let cols = Columns::for_language(lang);
    station
        .and_then(|name| table.find_row(cols.station, name))
        .or_else(|| table.find_row(cols.station, cols.observatory))
}

/// Wind at `station`; a missing row or a blank or `N/A` direction falls back to Star Ferry.
pub fn wind_at(table: &CsvTable, lang: Language, station: Option<&str>) -> Option<Wind> {
    let cols = Columns::for_language(lang);
    let reporting = |name: &str| {
        table.find_row(cols.station, name).filter(|row| {
            let direction = row.value(cols.wind_direction);
            !direction.is_empty() && direction != NOT_AVAILABLE
        })
    };

    let row = station
        .and_then(reporting)
        .or_else(|| reporting(cols.star_ferry))?;

    Some(Wind {
        direction: row.value(cols.wind_direction).to_string(),
        speed: row.number(cols.wind_speed),
        gust: row.number(cols.gust),
    })
}
