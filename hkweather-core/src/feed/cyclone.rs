//! Tropical cyclones currently tracked by the Observatory.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;

use crate::{http::HkoClient, model::TropicalCycloneInfo};

const TRACK_DATA_PATH: &str = "/locspc/android_data/TCTrackData/TC/tcFront.json";
const TRACK_IMAGE_DIR: &str = "/locspc/android_data/TCTrackImg";

#[derive(Debug, Deserialize)]
struct TcFrontResponse {
    #[serde(rename = "TC", default)]
    cyclones: Vec<TcEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TcEntry {
    #[serde(default)]
    tc_id: i64,
    #[serde(default)]
    display_order: i64,
    #[serde(default)]
    tc_name: String,
    #[serde(default)]
    en_name: String,
}

fn build(res: TcFrontResponse, images: &HashSet<String>, image_base: &str) -> Vec<TropicalCycloneInfo> {
    res.cyclones
        .into_iter()
        .map(|tc| {
            let image = format!("nwp_{}.png", tc.tc_id);
            let track_image_url = images
                .contains(&image)
                .then(|| format!("{image_base}{TRACK_IMAGE_DIR}/{image}"));

            TropicalCycloneInfo {
                id: tc.tc_id,
                display_order: tc.display_order,
                name_zh: tc.tc_name,
                name_en: tc.en_name,
                track_image_url,
            }
        })
        .collect()
}

pub async fn tropical_cyclones(client: &HkoClient) -> Result<Vec<TropicalCycloneInfo>> {
    let base = &client.endpoints().pda;
    let res: TcFrontResponse = client.get_json(&format!("{base}{TRACK_DATA_PATH}"), &[]).await?;

    let images: HashSet<String> = match client
        .get_text(&format!("{base}{TRACK_IMAGE_DIR}/png_list.myobs"), &[])
        .await
    {
        Ok(list) => list.lines().map(|l| l.trim().to_string()).collect(),
        Err(err) => {
            warn!("cyclone track image list unavailable: {err:#}");
            HashSet::new()
        }
    };

    Ok(build(res, &images, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_listed_track_images_only() {
        let res: TcFrontResponse = serde_json::from_str(
            r#"{"TC":[{"tcId":2315,"displayOrder":1,"tcName":"小犬","enName":"KOINU"},
                      {"tcId":2316,"displayOrder":2,"tcName":"布拉萬","enName":"BOLAVEN"}]}"#,
        )
        .unwrap();
        let images: HashSet<String> = ["nwp_2315.png".to_string()].into();

        let list = build(res, &images, "https://pda.weather.gov.hk");
        assert_eq!(list.len(), 2);
        assert_eq!(
            list[0].track_image_url.as_deref(),
            Some("https://pda.weather.gov.hk/locspc/android_data/TCTrackImg/nwp_2315.png")
        );
        assert_eq!(list[1].track_image_url, None);
        assert_eq!(list[1].name_en, "BOLAVEN");
    }

    #[test]
    fn no_cyclones() {
        let res: TcFrontResponse = serde_json::from_str("{}").unwrap();
        assert!(build(res, &HashSet::new(), "").is_empty());
    }
}
