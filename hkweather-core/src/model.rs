use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::DataError;

const HK_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Hong Kong Time (UTC+8, no daylight saving).
pub fn hk_offset() -> FixedOffset {
    FixedOffset::east_opt(HK_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn hk_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&hk_offset())
}

pub fn hk_today() -> NaiveDate {
    hk_now().date_naive()
}

/// Display language. HKO publishes every dataset in English and Traditional Chinese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// `lang=` parameter of `weather.php`.
    pub fn query_code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "tc",
        }
    }

    /// Suffix used by station GeoJSON properties (`AutomaticWeatherStation_uc`).
    pub fn unicode_code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "uc",
        }
    }

    /// File suffix of the regional-weather CSVs.
    pub fn csv_suffix(&self) -> &'static str {
        match self {
            Language::En => "",
            Language::Zh => "_uc",
        }
    }

    pub fn hong_kong(&self) -> &'static str {
        match self {
            Language::En => "Hong Kong",
            Language::Zh => "香港",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "tc" | "chinese" => Ok(Language::Zh),
            _ => Err(anyhow::anyhow!("Unknown language '{s}'. Supported languages: en, zh.")),
        }
    }
}

/// HKO weather icon codes.
/// See: https://www.hko.gov.hk/textonly/v2/explain/wxicon_e.htm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherStatusIcon {
    Sunny,
    SunnyPeriods,
    SunnyIntervals,
    SunnyPeriodsWithAFewShowers,
    SunnyIntervalsWithShowers,
    Cloudy,
    Overcast,
    LightRain,
    Rain,
    HeavyRain,
    Thunderstorms,
    NewMoon,
    WaxingCrescentMoon,
    FirstQuarterMoon,
    FullMoon,
    LastQuarterMoon,
    WaningCrescentMoon,
    MostlyCloudy,
    MostlyFine,
    Windy,
    Dry,
    Humid,
    Fog,
    Mist,
    Haze,
    Hot,
    Warm,
    Cool,
    Cold,
}

impl WeatherStatusIcon {
    const ALL: [WeatherStatusIcon; 29] = [
        Self::Sunny,
        Self::SunnyPeriods,
        Self::SunnyIntervals,
        Self::SunnyPeriodsWithAFewShowers,
        Self::SunnyIntervalsWithShowers,
        Self::Cloudy,
        Self::Overcast,
        Self::LightRain,
        Self::Rain,
        Self::HeavyRain,
        Self::Thunderstorms,
        Self::NewMoon,
        Self::WaxingCrescentMoon,
        Self::FirstQuarterMoon,
        Self::FullMoon,
        Self::LastQuarterMoon,
        Self::WaningCrescentMoon,
        Self::MostlyCloudy,
        Self::MostlyFine,
        Self::Windy,
        Self::Dry,
        Self::Humid,
        Self::Fog,
        Self::Mist,
        Self::Haze,
        Self::Hot,
        Self::Warm,
        Self::Cool,
        Self::Cold,
    ];

    pub fn code(&self) -> u16 {
        match self {
            Self::Sunny => 50,
            Self::SunnyPeriods => 51,
            Self::SunnyIntervals => 52,
            Self::SunnyPeriodsWithAFewShowers => 53,
            Self::SunnyIntervalsWithShowers => 54,
            Self::Cloudy => 60,
            Self::Overcast => 61,
            Self::LightRain => 62,
            Self::Rain => 63,
            Self::HeavyRain => 64,
            Self::Thunderstorms => 65,
            Self::NewMoon => 70,
            Self::WaxingCrescentMoon => 71,
            Self::FirstQuarterMoon => 72,
            Self::FullMoon => 73,
            Self::LastQuarterMoon => 74,
            Self::WaningCrescentMoon => 75,
            Self::MostlyCloudy => 76,
            Self::MostlyFine => 77,
            Self::Windy => 80,
            Self::Dry => 81,
            Self::Humid => 82,
            Self::Fog => 83,
            Self::Mist => 84,
            Self::Haze => 85,
            Self::Hot => 90,
            Self::Warm => 91,
            Self::Cool => 92,
            Self::Cold => 93,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| i64::from(icon.code()) == code)
    }

    pub fn description(&self, lang: Language) -> &'static str {
        let (en, zh) = match self {
            Self::Sunny => ("Sunny", "陽光充沛"),
            Self::SunnyPeriods => ("Sunny Periods", "間有陽光"),
            Self::SunnyIntervals => ("Sunny Intervals", "短暫陽光"),
            Self::SunnyPeriodsWithAFewShowers => ("Sunny Periods with A Few Showers", "間有陽光幾陣驟雨"),
            Self::SunnyIntervalsWithShowers => ("Sunny Intervals with Showers", "短暫陽光有驟雨"),
            Self::Cloudy => ("Cloudy", "多雲"),
            Self::Overcast => ("Overcast", "密雲"),
            Self::LightRain => ("Light Rain", "微雨"),
            Self::Rain => ("Rain", "雨"),
            Self::HeavyRain => ("Heavy Rain", "大雨"),
            Self::Thunderstorms => ("Thunderstorms", "雷暴"),
            Self::NewMoon => ("Fine (New Moon)", "天色良好（新月）"),
            Self::WaxingCrescentMoon => ("Fine (Waxing Crescent Moon)", "天色良好（上弦前）"),
            Self::FirstQuarterMoon => ("Fine (First Quarter Moon)", "天色良好（上弦月）"),
            Self::FullMoon => ("Fine (Full Moon)", "天色良好（滿月）"),
            Self::LastQuarterMoon => ("Fine (Last Quarter Moon)", "天色良好（下弦月）"),
            Self::WaningCrescentMoon => ("Fine (Waning Crescent Moon)", "天色良好（下弦後）"),
            Self::MostlyCloudy => ("Mostly Cloudy", "大致多雲"),
            Self::MostlyFine => ("Mostly Fine", "天色大致良好"),
            Self::Windy => ("Windy", "大風"),
            Self::Dry => ("Dry", "乾燥"),
            Self::Humid => ("Humid", "潮濕"),
            Self::Fog => ("Fog", "霧"),
            Self::Mist => ("Mist", "薄霧"),
            Self::Haze => ("Haze", "煙霞"),
            Self::Hot => ("Hot", "熱"),
            Self::Warm => ("Warm", "暖"),
            Self::Cool => ("Cool", "涼"),
            Self::Cold => ("Cold", "冷"),
        };
        match lang {
            Language::En => en,
            Language::Zh => zh,
        }
    }

    pub fn icon_url(&self) -> String {
        format!("https://www.hko.gov.hk/images/HKOWxIconOutline/pic{}.png", self.code())
    }
}

/// Forecast for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub date: NaiveDate,
    pub highest_temperature: Option<f64>,
    pub lowest_temperature: Option<f64>,
    pub max_relative_humidity: Option<f64>,
    pub min_relative_humidity: Option<f64>,
    pub chance_of_rain: Option<f64>,
    pub weather_icon: Option<WeatherStatusIcon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeatherInfo {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// Degrees clockwise from north.
    pub wind_direction: Option<f64>,
    /// km/h
    pub wind_speed: Option<f64>,
    pub weather_icon: Option<WeatherStatusIcon>,
}

/// 10-minute mean wind at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Compass point, e.g. "North-east" / "東北".
    pub direction: String,
    /// km/h
    pub speed: Option<f64>,
    /// km/h
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub rise: NaiveTime,
    pub transit: NaiveTime,
    pub set: NaiveTime,
}

/// Moon events; any of them may not happen on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoonTimes {
    pub rise: Option<NaiveTime>,
    pub transit: Option<NaiveTime>,
    pub set: Option<NaiveTime>,
}

/// Composite snapshot assembled from every feed for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherInfo {
    #[serde(flatten)]
    pub today: WeatherInfo,
    /// Name shown to the user; "Hong Kong" when no local station applies.
    pub weather_station: String,
    pub current_temperature: Option<f64>,
    pub current_humidity: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind: Option<Wind>,
    pub sun: SunTimes,
    pub moon: MoonTimes,
    pub forecast: Vec<WeatherInfo>,
    pub hourly: Vec<HourlyWeatherInfo>,
}

impl CurrentWeatherInfo {
    pub fn date(&self) -> NaiveDate {
        self.today.date
    }

    pub fn chance_of_rain(&self) -> Option<f64> {
        self.today.chance_of_rain
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarDate {
    /// Sexagenary year, e.g. "癸卯".
    pub year: String,
    pub zodiac: String,
    pub date: String,
    /// Solar term of the day, only known for today.
    pub climatology: Option<String>,
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}年 {} {}", self.year, self.zodiac, self.date)?;
        if let Some(term) = &self.climatology {
            write!(f, " {term}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TropicalCycloneInfo {
    pub id: i64,
    pub display_order: i64,
    pub name_zh: String,
    pub name_en: String,
    pub track_image_url: Option<String>,
}

impl TropicalCycloneInfo {
    pub fn name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.name_en,
            Language::Zh => &self.name_zh,
        }
    }
}

/// Warning statement codes used by the `warningInfo` dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeatherWarningsType {
    Wfire,
    Wfrost,
    Whot,
    Wcold,
    Wmsgnl,
    Wrain,
    Wfntsa,
    Wl,
    Wtcsgnl,
    Wtmw,
    Wts,
}

impl WeatherWarningsType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Wfire => "WFIRE",
            Self::Wfrost => "WFROST",
            Self::Whot => "WHOT",
            Self::Wcold => "WCOLD",
            Self::Wmsgnl => "WMSGNL",
            Self::Wrain => "WRAIN",
            Self::Wfntsa => "WFNTSA",
            Self::Wl => "WL",
            Self::Wtcsgnl => "WTCSGNL",
            Self::Wtmw => "WTMW",
            Self::Wts => "WTS",
        }
    }

    pub fn name(&self, lang: Language) -> &'static str {
        let (en, zh) = match self {
            Self::Wfire => ("Fire Danger Warning", "火災危險警告"),
            Self::Wfrost => ("Frost Warning", "霜凍警告"),
            Self::Whot => ("Very Hot Weather Warning", "酷熱天氣警告"),
            Self::Wcold => ("Cold Weather Warning", "寒冷天氣警告"),
            Self::Wmsgnl => ("Strong Monsoon Signal", "強烈季候風信號"),
            Self::Wrain => ("Rainstorm Warning Signal", "暴雨警告信號"),
            Self::Wfntsa => (
                "Special Announcement on Flooding in the northern New Territories",
                "新界北部水浸特別報告",
            ),
            Self::Wl => ("Landslip Warning", "山泥傾瀉警告"),
            Self::Wtcsgnl => ("Tropical Cyclone Warning Signal", "熱帶氣旋警告信號"),
            Self::Wtmw => ("Tsunami Warning", "海嘯警告"),
            Self::Wts => ("Thunderstorm Warning", "雷暴警告"),
        };
        match lang {
            Language::En => en,
            Language::Zh => zh,
        }
    }
}

impl FromStr for WeatherWarningsType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_uppercase().as_str() {
            "WFIRE" => Self::Wfire,
            "WFROST" => Self::Wfrost,
            "WHOT" => Self::Whot,
            "WCOLD" => Self::Wcold,
            "WMSGNL" => Self::Wmsgnl,
            "WRAIN" => Self::Wrain,
            "WFNTSA" => Self::Wfntsa,
            "WL" => Self::Wl,
            "WTCSGNL" => Self::Wtcsgnl,
            "WTMW" => Self::Wtmw,
            "WTS" => Self::Wts,
            _ => return Err(DataError::UnknownWarning(s.to_string())),
        };
        Ok(ty)
    }
}

/// Special weather tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherTip {
    pub text: String,
    pub updated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_codes_roundtrip() {
        for icon in WeatherStatusIcon::ALL {
            assert_eq!(WeatherStatusIcon::from_code(i64::from(icon.code())), Some(icon));
        }
    }

    #[test]
    fn unknown_icon_code_is_none() {
        assert_eq!(WeatherStatusIcon::from_code(0), None);
        assert_eq!(WeatherStatusIcon::from_code(99), None);
    }

    #[test]
    fn icon_url_uses_code() {
        assert!(WeatherStatusIcon::Thunderstorms.icon_url().ends_with("pic65.png"));
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::Zh.query_code(), "tc");
        assert_eq!(Language::Zh.unicode_code(), "uc");
        assert_eq!(Language::Zh.csv_suffix(), "_uc");
        assert_eq!(Language::En.csv_suffix(), "");
        assert_eq!(Language::default(), Language::Zh);
    }

    #[test]
    fn parses_language() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("tc".parse::<Language>().unwrap(), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn warning_codes_are_case_insensitive() {
        assert_eq!("wtcsgnl".parse::<WeatherWarningsType>(), Ok(WeatherWarningsType::Wtcsgnl));
        assert_eq!(
            "WXYZ".parse::<WeatherWarningsType>(),
            Err(DataError::UnknownWarning("WXYZ".into()))
        );
        assert_eq!(WeatherWarningsType::Wrain.code(), "WRAIN");
    }

    #[test]
    fn lunar_date_display_includes_solar_term() {
        let mut lunar = LunarDate {
            year: "癸卯".into(),
            zodiac: "兔".into(),
            date: "九月初四".into(),
            climatology: None,
        };
        assert_eq!(lunar.to_string(), "癸卯年 兔 九月初四");

        lunar.climatology = Some("霜降".into());
        assert_eq!(lunar.to_string(), "癸卯年 兔 九月初四 霜降");
    }

    #[test]
    fn hk_offset_is_utc_plus_8() {
        assert_eq!(hk_offset().local_minus_utc(), 8 * 3600);
    }
}
