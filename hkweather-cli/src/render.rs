//! Plain-text output for each command, as `Display` adapters.

use chrono::NaiveTime;
use hkweather_core::{
    ActiveWarnings, Coordinate, CurrentWeatherInfo, Language, StationRegistry,
    TropicalCycloneInfo, WeatherInfo, WeatherTip, geo::HK_DEFAULT_LOCATION,
};
use std::fmt;

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.0}{unit}"),
        None => "--".to_string(),
    }
}

fn range(low: Option<f64>, high: Option<f64>, unit: &str) -> String {
    format!("{}-{}", reading(low, ""), reading(high, unit))
}

fn clock(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn day_line(day: &WeatherInfo, lang: Language) -> String {
    let icon = day.weather_icon.map(|i| i.description(lang)).unwrap_or_default();
    format!(
        "{}  {:>9}  {:>8}  {:>4}  {icon}",
        day.date.format("%a %d/%m"),
        range(day.lowest_temperature, day.highest_temperature, "°C"),
        range(day.min_relative_humidity, day.max_relative_humidity, "%"),
        reading(day.chance_of_rain, "%"),
    )
}

pub struct Current<'a>(pub &'a CurrentWeatherInfo, pub Language);

impl fmt::Display for Current<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Current(info, lang) = *self;
        let (now, humidity, uv, rain, sun, moon) = match lang {
            Language::En => ("Now", "Humidity", "UV index", "Chance of rain", "Sun", "Moon"),
            Language::Zh => ("現時", "濕度", "紫外線指數", "降雨概率", "日出日落", "月出月落"),
        };

        writeln!(f, "{}  {}", info.weather_station, info.date())?;
        writeln!(
            f,
            "{now}: {}  {humidity}: {}",
            reading(info.current_temperature, "°C"),
            reading(info.current_humidity, "%"),
        )?;
        if let Some(icon) = info.today.weather_icon {
            writeln!(f, "{}", icon.description(lang))?;
        }
        if let Some(wind) = &info.wind {
            writeln!(
                f,
                "{} {} km/h (gust {})",
                wind.direction,
                reading(wind.speed, ""),
                reading(wind.gust, ""),
            )?;
        }
        if let Some(index) = info.uv_index {
            writeln!(f, "{uv}: {index}")?;
        }
        writeln!(f, "{rain}: {}", reading(info.chance_of_rain(), "%"))?;
        writeln!(
            f,
            "{sun}: {} / {}  {moon}: {} / {}",
            info.sun.rise.format("%H:%M"),
            info.sun.set.format("%H:%M"),
            clock(info.moon.rise),
            clock(info.moon.set),
        )?;

        if !info.hourly.is_empty() {
            writeln!(f)?;
            for hour in info.hourly.iter().take(12) {
                let icon = hour.weather_icon.map(|i| i.description(lang)).unwrap_or_default();
                writeln!(
                    f,
                    "{}  {:>5}  {:>4}  {icon}",
                    hour.time.format("%H:%M"),
                    reading(hour.temperature, "°C"),
                    reading(hour.humidity, "%"),
                )?;
            }
        }

        if !info.forecast.is_empty() {
            writeln!(f)?;
            for day in &info.forecast {
                writeln!(f, "{}", day_line(day, lang))?;
            }
        }

        Ok(())
    }
}

pub struct Warnings<'a>(pub &'a ActiveWarnings, pub Language);

impl fmt::Display for Warnings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Warnings(warnings, lang) = *self;
        if warnings.is_empty() {
            return match lang {
                Language::En => writeln!(f, "No warnings in force."),
                Language::Zh => writeln!(f, "現時沒有警告生效。"),
            };
        }

        for (ty, text) in warnings {
            writeln!(f, "[{}] {}", ty.code(), ty.name(lang))?;
            if let Some(text) = text {
                writeln!(f, "{text}\n")?;
            }
        }
        Ok(())
    }
}

pub struct Tips<'a>(pub &'a [WeatherTip], pub Language);

impl fmt::Display for Tips<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Tips(tips, lang) = *self;
        if tips.is_empty() {
            return match lang {
                Language::En => writeln!(f, "No special weather tips."),
                Language::Zh => writeln!(f, "現時沒有特別天氣提示。"),
            };
        }

        for tip in tips {
            writeln!(f, "{}  {}", tip.updated_at.format("%Y-%m-%d %H:%M"), tip.text)?;
        }
        Ok(())
    }
}

pub struct Cyclones<'a>(pub &'a [TropicalCycloneInfo], pub Language);

impl fmt::Display for Cyclones<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cyclones(cyclones, lang) = *self;
        if cyclones.is_empty() {
            return match lang {
                Language::En => writeln!(f, "No tropical cyclones."),
                Language::Zh => writeln!(f, "現時沒有熱帶氣旋。"),
            };
        }

        for tc in cyclones {
            write!(f, "{:>3}  {}", tc.display_order, tc.name(lang))?;
            if let Some(url) = &tc.track_image_url {
                write!(f, "  {url}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Nearest station of each kind, with distance. `None` means the Observatory.
pub struct Stations<'a>(pub &'a StationRegistry, pub Option<Coordinate>, pub Language);

impl fmt::Display for Stations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Stations(registry, origin, lang) = *self;
        let origin = origin.unwrap_or(HK_DEFAULT_LOCATION);
        writeln!(f, "{origin}")?;

        let rows = [
            ("temperature", registry.nearest_temperature(origin)),
            ("humidity", registry.nearest_humidity(origin)),
            ("wind", registry.nearest_wind(origin)),
        ];
        for (kind, nearest) in rows {
            match nearest {
                Some((station, km)) => writeln!(f, "{kind:<12} {} ({km:.1} km)", station.name(lang))?,
                None => writeln!(f, "{kind:<12} --")?,
            }
        }
        match registry.nearest_forecast(origin) {
            Some((station, km)) => writeln!(f, "{:<12} {} ({km:.1} km)", "forecast", station.id),
            None => writeln!(f, "{:<12} --", "forecast"),
        }
    }
}
