//! Special weather tips (`swt`).

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    feed::{WEATHER_PHP, parse_update_time},
    http::HkoClient,
    model::{Language, WeatherTip},
};

#[derive(Debug, Deserialize)]
struct SwtResponse {
    #[serde(default)]
    swt: Vec<SwtEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwtEntry {
    desc: String,
    update_time: String,
}

fn build(res: SwtResponse) -> Result<Vec<WeatherTip>> {
    res.swt
        .into_iter()
        .map(|e| -> Result<WeatherTip> {
            Ok(WeatherTip {
                updated_at: parse_update_time(&e.update_time)?,
                text: e.desc,
            })
        })
        .collect::<Result<Vec<_>>>()
        .context("Invalid special weather tip")
}

pub async fn weather_tips(client: &HkoClient, lang: Language) -> Result<Vec<WeatherTip>> {
    let url = format!("{}{WEATHER_PHP}", client.endpoints().data);
    let res: SwtResponse = client
        .get_json(&url, &[("dataType", "swt"), ("lang", lang.query_code())])
        .await?;
    build(res)
}
