//! Territory-wide 9-day forecast (`fnd`) and location-specific forecasts (OCF).

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::{
    feed::{WEATHER_PHP, parse_compact_date, parse_compact_hour, parse_percentage},
    http::HkoClient,
    model::{Language, WeatherInfo, WeatherStatusIcon},
};

#[derive(Debug, Deserialize)]
struct FndResponse {
    #[serde(rename = "weatherForecast", default)]
    weather_forecast: Vec<FndDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FndDay {
    forecast_date: String,
    forecast_maxtemp: Option<Measure>,
    forecast_mintemp: Option<Measure>,
    forecast_maxrh: Option<Measure>,
    forecast_minrh: Option<Measure>,
    #[serde(rename = "ForecastIcon")]
    forecast_icon: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: Option<f64>,
}

fn measure(m: &Option<Measure>) -> Option<f64> {
    m.as_ref().and_then(|m| m.value)
}

impl FndDay {
    fn into_weather_info(self) -> Result<WeatherInfo> {
        Ok(WeatherInfo {
            date: parse_compact_date(&self.forecast_date)?,
            highest_temperature: measure(&self.forecast_maxtemp),
            lowest_temperature: measure(&self.forecast_mintemp),
            max_relative_humidity: measure(&self.forecast_maxrh),
            min_relative_humidity: measure(&self.forecast_minrh),
            chance_of_rain: None,
            weather_icon: self.forecast_icon.and_then(WeatherStatusIcon::from_code),
        })
    }
}

/// Daily outlook in date order. Chance of rain is not part of this dataset.
pub async fn nine_day_forecast(client: &HkoClient, lang: Language) -> Result<Vec<WeatherInfo>> {
    let url = format!("{}{WEATHER_PHP}", client.endpoints().data);
    let res: FndResponse = client
        .get_json(&url, &[("dataType", "fnd"), ("lang", lang.query_code())])
        .await?;
    parse_fnd(res)
}

fn parse_fnd(res: FndResponse) -> Result<Vec<WeatherInfo>> {
    res.weather_forecast
        .into_iter()
        .map(FndDay::into_weather_info)
        .collect::<Result<Vec<_>>>()
        .context("Invalid 9-day forecast entry")
}

/// Forecast for one OCF grid point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationForecast {
    pub daily: Vec<StationDay>,
    pub hourly: Vec<StationHour>,
}

impl StationForecast {
    pub fn chance_of_rain_on(&self, date: NaiveDate) -> Option<f64> {
        self.daily
            .iter()
            .find(|d| d.date == date)
            .and_then(|d| d.chance_of_rain)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationDay {
    pub date: NaiveDate,
    pub chance_of_rain: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationHour {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Raw icon code; absent or unrecognised codes continue the previous hour's weather.
    pub weather_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcfResponse {
    #[serde(default)]
    daily_forecast: Vec<OcfDay>,
    #[serde(default)]
    hourly_weather_forecast: Vec<OcfHour>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcfDay {
    forecast_date: String,
    forecast_chance_of_rain: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcfHour {
    forecast_hour: String,
    forecast_temperature: Option<f64>,
    forecast_relative_humidity: Option<f64>,
    forecast_wind_direction: Option<f64>,
    forecast_wind_speed: Option<f64>,
    forecast_weather: Option<i64>,
}

/// Served under `/ocf/dat/{id}.xml`, but the body is JSON.
pub async fn station_forecast(client: &HkoClient, station_id: &str) -> Result<StationForecast> {
    let url = format!("{}/ocf/dat/{station_id}.xml", client.endpoints().maps);
    let res: OcfResponse = client.get_json(&url, &[]).await?;
    parse_ocf(res).with_context(|| format!("Invalid forecast for station {station_id}"))
}

fn parse_ocf(res: OcfResponse) -> Result<StationForecast> {
    let daily = res
        .daily_forecast
        .into_iter()
        .map(|d| -> Result<StationDay> {
            Ok(StationDay {
                date: parse_compact_date(&d.forecast_date)?,
                chance_of_rain: d
                    .forecast_chance_of_rain
                    .as_deref()
                    .map(parse_percentage)
                    .transpose()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let hourly = res
        .hourly_weather_forecast
        .into_iter()
        .map(|h| -> Result<StationHour> {
            Ok(StationHour {
                time: parse_compact_hour(&h.forecast_hour)?,
                temperature: h.forecast_temperature,
                humidity: h.forecast_relative_humidity,
                wind_direction: h.forecast_wind_direction,
                wind_speed: h.forecast_wind_speed,
                weather_code: h.forecast_weather,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StationForecast { daily, hourly })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nine_day_forecast() {
        let res: FndResponse = serde_json::from_str(
            r#"{"generalSituation":"...","weatherForecast":[
                {"forecastDate":"20231018","week":"Wednesday",
                 "forecastMaxtemp":{"value":30,"unit":"C"},"forecastMintemp":{"value":24,"unit":"C"},
                 "forecastMaxrh":{"value":85,"unit":"percent"},"forecastMinrh":{"value":60,"unit":"percent"},
                 "ForecastIcon":51,"PSR":"Low"},
                {"forecastDate":"20231019","forecastMaxtemp":{"value":29,"unit":"C"},"ForecastIcon":99}
            ]}"#,
        )
        .unwrap();

        let days = parse_fnd(res).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2023, 10, 18).unwrap());
        assert_eq!(days[0].highest_temperature, Some(30.0));
        assert_eq!(days[0].min_relative_humidity, Some(60.0));
        assert_eq!(days[0].weather_icon, Some(WeatherStatusIcon::SunnyPeriods));
        assert_eq!(days[1].lowest_temperature, None);
        assert_eq!(days[1].weather_icon, None);
    }

    #[test]
    fn rejects_bad_forecast_date() {
        let res: FndResponse =
            serde_json::from_str(r#"{"weatherForecast":[{"forecastDate":"18/10/2023"}]}"#).unwrap();
        assert!(parse_fnd(res).is_err());
    }

    #[test]
    fn parses_station_forecast() {
        let res: OcfResponse = serde_json::from_str(
            r#"{"LastModified":20231018150000,
                "DailyForecast":[{"ForecastDate":"20231018","ForecastChanceOfRain":"10%"},
                                 {"ForecastDate":"20231019","ForecastChanceOfRain":"30%"},
                                 {"ForecastDate":"20231020"}],
                "HourlyWeatherForecast":[{"ForecastHour":"2023101816","ForecastTemperature":28.1,
                    "ForecastRelativeHumidity":70.0,"ForecastWindDirection":90.0,"ForecastWindSpeed":12.0,
                    "ForecastWeather":51},
                    {"ForecastHour":"2023101817","ForecastTemperature":27.6}]}"#,
        )
        .unwrap();

        let forecast = parse_ocf(res).unwrap();
        let oct19 = NaiveDate::from_ymd_opt(2023, 10, 19).unwrap();
        assert_eq!(forecast.daily[0].chance_of_rain, Some(10.0));
        assert_eq!(forecast.chance_of_rain_on(oct19), Some(30.0));
        assert_eq!(forecast.chance_of_rain_on(NaiveDate::from_ymd_opt(2023, 10, 20).unwrap()), None);
        assert_eq!(forecast.chance_of_rain_on(NaiveDate::from_ymd_opt(2023, 10, 30).unwrap()), None);

        assert_eq!(forecast.hourly.len(), 2);
        assert_eq!(forecast.hourly[0].weather_code, Some(51));
        assert_eq!(forecast.hourly[1].weather_code, None);
        assert_eq!(forecast.hourly[1].temperature, Some(27.6));
    }

    #[test]
    fn rejects_bad_chance_of_rain() {
        let res: OcfResponse = serde_json::from_str(
            r#"{"DailyForecast":[{"ForecastDate":"20231018","ForecastChanceOfRain":"lots"}]}"#,
        )
        .unwrap();
        assert!(parse_ocf(res).is_err());
    }
}
