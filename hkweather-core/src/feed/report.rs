//! Current weather report (`rhrread`).

use anyhow::Result;
use serde::Deserialize;

use crate::{
    feed::WEATHER_PHP,
    http::HkoClient,
    model::{Language, WeatherStatusIcon},
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurrentReport {
    pub uv_index: Option<f64>,
    pub icon: Option<WeatherStatusIcon>,
}

#[derive(Debug, Deserialize)]
struct RhrreadResponse {
    /// An object while the sun is up, an empty string otherwise.
    #[serde(default)]
    uvindex: serde_json::Value,
    #[serde(default)]
    icon: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct UvIndexReport {
    #[serde(default)]
    data: Vec<UvReading>,
}

#[derive(Debug, Deserialize)]
struct UvReading {
    value: Option<f64>,
}

impl From<RhrreadResponse> for CurrentReport {
    fn from(res: RhrreadResponse) -> Self {
        let uv_index = serde_json::from_value::<UvIndexReport>(res.uvindex)
            .ok()
            .and_then(|report| report.data.first().and_then(|r| r.value));

        let icon = res.icon.first().copied().and_then(WeatherStatusIcon::from_code);

        Self { uv_index, icon }
    }
}

pub async fn current_report(client: &HkoClient, lang: Language) -> Result<CurrentReport> {
    let url = format!("{}{WEATHER_PHP}", client.endpoints().data);
    let res: RhrreadResponse = client
        .get_json(&url, &[("dataType", "rhrread"), ("lang", lang.query_code())])
        .await?;
    Ok(res.into())
}
