//! Weather warnings in force (`warningInfo`).

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::{
    feed::{WEATHER_PHP, parse_update_time},
    http::HkoClient,
    model::{Language, WeatherWarningsType},
};

/// Warning type -> full bulletin text (`None` when the Observatory gave no text).
pub type ActiveWarnings = BTreeMap<WeatherWarningsType, Option<String>>;

#[derive(Debug, Deserialize)]
struct WarningInfoResponse {
    #[serde(default)]
    details: Vec<WarningDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarningDetail {
    #[serde(default)]
    warning_statement_code: String,
    #[serde(default)]
    contents: Vec<String>,
    #[serde(default)]
    update_time: String,
}

/// Bulletin text: the warning name (unless already the first line), the contents,
/// then the dispatch line.
pub fn bulletin_text(
    ty: WeatherWarningsType,
    contents: &[String],
    issued: DateTime<FixedOffset>,
    lang: Language,
) -> String {
    let name = ty.name(lang);
    let mut lines: Vec<&str> = contents.iter().map(String::as_str).collect();
    if !lines
        .first()
        .is_some_and(|first| first.trim().to_lowercase() == name.to_lowercase())
    {
        lines.insert(0, name);
    }

    let dispatch = match lang {
        Language::En => format!(
            "Dispatched by the Hong Kong Observatory at {}",
            issued.format("%H:%M HKT on %d.%m.%Y")
        ),
        Language::Zh => format!("以上天氣稿由天文台於{}發出", issued.format("%Y年%m月%d日%H時%M分")),
    };

    let mut text = lines.join("\n");
    text.push('\n');
    text.push_str(&dispatch);
    text
}

fn build(res: WarningInfoResponse, lang: Language) -> ActiveWarnings {
    let mut warnings = ActiveWarnings::new();

    for detail in res.details {
        let ty: WeatherWarningsType = match detail.warning_statement_code.parse() {
            Ok(ty) => ty,
            Err(err) => {
                warn!("skipping warning: {err}");
                continue;
            }
        };

        let text = if detail.contents.is_empty() {
            None
        } else {
            match parse_update_time(&detail.update_time) {
                Ok(issued) => Some(bulletin_text(ty, &detail.contents, issued, lang)),
                Err(err) => {
                    warn!(code = ty.code(), "skipping warning: {err}");
                    continue;
                }
            }
        };

        warnings.insert(ty, text);
    }

    warnings
}

pub async fn active_warnings(client: &HkoClient, lang: Language) -> Result<ActiveWarnings> {
    let url = format!("{}{WEATHER_PHP}", client.endpoints().data);
    let res: WarningInfoResponse = client
        .get_json(&url, &[("dataType", "warningInfo"), ("lang", lang.query_code())])
        .await?;
    Ok(build(res, lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"details":[
        {"contents":["The Amber Rainstorm Warning Signal was issued at 2:45 p.m.","Heavy rain has fallen."],
         "warningStatementCode":"WRAIN","subtype":"WRAINA","updateTime":"2023-10-18T14:45:00+08:00"},
        {"contents":["Tropical Cyclone Warning Signal","Signal No. 3 is in force."],
         "warningStatementCode":"WTCSGNL","subtype":"TC3","updateTime":"2023-10-18T09:40:00+08:00"},
        {"contents":[],"warningStatementCode":"WFIRE","updateTime":"2023-10-18T06:00:00+08:00"},
        {"contents":["?"],"warningStatementCode":"WNEW","updateTime":"2023-10-18T06:00:00+08:00"}
    ]}"#;

    #[test]
    fn builds_bulletins_in_english() {
        let res: WarningInfoResponse = serde_json::from_str(SAMPLE).unwrap();
        let warnings = build(res, Language::En);

        assert_eq!(warnings.len(), 3);

        let rain = warnings[&WeatherWarningsType::Wrain].as_deref().unwrap();
        assert_eq!(
            rain,
            "Rainstorm Warning Signal\n\
             The Amber Rainstorm Warning Signal was issued at 2:45 p.m.\n\
             Heavy rain has fallen.\n\
             Dispatched by the Hong Kong Observatory at 14:45 HKT on 18.10.2023"
        );

        let tc = warnings[&WeatherWarningsType::Wtcsgnl].as_deref().unwrap();
        assert!(tc.starts_with("Tropical Cyclone Warning Signal\nSignal No. 3"));

        assert_eq!(warnings[&WeatherWarningsType::Wfire], None);
    }

    #[test]
    fn chinese_dispatch_line() {
        let issued = DateTime::parse_from_rfc3339("2023-10-18T09:05:00+08:00").unwrap();
        let text = bulletin_text(
            WeatherWarningsType::Whot,
            &["酷熱天氣警告".to_string(), "天氣酷熱。".to_string()],
            issued,
            Language::Zh,
        );
        assert_eq!(text, "酷熱天氣警告\n天氣酷熱。\n以上天氣稿由天文台於2023年10月18日09時05分發出");
    }

    #[test]
    fn no_details_means_no_warnings() {
        let res: WarningInfoResponse = serde_json::from_str("{}").unwrap();
        assert!(build(res, Language::Zh).is_empty());
    }

    #[test]
    fn bad_update_time_skips_entry() {
        let res: WarningInfoResponse = serde_json::from_str(
            r#"{"details":[{"contents":["x"],"warningStatementCode":"WTS","updateTime":"yesterday"}]}"#,
        )
        .unwrap();
        assert!(build(res, Language::En).is_empty());
    }
}
