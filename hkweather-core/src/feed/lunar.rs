use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{error::DataError, http::HkoClient, model::LunarDate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LunarDateResponse {
    /// e.g. `"癸卯年，兔"`
    lunar_year: String,
    lunar_date: String,
}

#[derive(Debug, Deserialize)]
struct SolarTermResponse {
    #[serde(default)]
    solar_term: String,
}

fn parse_lunar(res: LunarDateResponse) -> Result<LunarDate, DataError> {
    let mut parts = res.lunar_year.split('，');
    let year = parts
        .next()
        .map(|y| y.replace('年', ""))
        .filter(|y| !y.is_empty())
        .ok_or(DataError::Missing("LunarYear"))?;
    let zodiac = parts
        .next()
        .map(|z| z.trim().to_string())
        .ok_or(DataError::Missing("LunarYear zodiac"))?;

    Ok(LunarDate {
        year,
        zodiac,
        date: res.lunar_date,
        climatology: None,
    })
}

/// Lunar calendar date for `date`, without the solar term.
pub async fn lunar_date(client: &HkoClient, date: NaiveDate) -> Result<LunarDate> {
    let url = format!("{}/weatherAPI/opendata/lunardate.php", client.endpoints().data);
    let date = date.format("%Y-%m-%d").to_string();
    let res: LunarDateResponse = client.get_json(&url, &[("date", date.as_str())]).await?;
    Ok(parse_lunar(res)?)
}

/// Solar term in effect today, if any. Served under an `.xml` path with a JSON body.
pub async fn solar_term(client: &HkoClient) -> Result<Option<String>> {
    let url = format!("{}/locspc/android_data/lunar_date_uc.xml", client.endpoints().pda);
    let res: SolarTermResponse = client.get_json(&url, &[]).await?;
    let term = res.solar_term.trim();
    Ok((!term.is_empty()).then(|| term.to_string()))
}
