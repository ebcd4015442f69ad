use anyhow::{Context, Result, anyhow};
use csv::StringRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URLs of the three HKO hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Open-data API (`weather.php`, `opendata.php`, regional CSVs).
    pub data: String,
    /// MyObservatory app data (cyclone tracks, solar terms).
    pub pda: String,
    /// Location-specific forecasts.
    pub maps: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            data: "https://data.weather.gov.hk".to_string(),
            pda: "https://pda.weather.gov.hk".to_string(),
            maps: "https://maps.weather.gov.hk".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every host at one server. Used by tests against a mock server.
    pub fn single(base: &str) -> Self {
        Self {
            data: base.to_string(),
            pda: base.to_string(),
            maps: base.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HkoClient {
    http: Client,
    endpoints: Endpoints,
}

impl HkoClient {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET `url` and return the body of a successful response.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!(url, ?query, "fetching");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Request to {} failed with status {}: {}",
                url,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(body.trim_start_matches('\u{feff}'))
            .with_context(|| format!("Failed to parse JSON from {url}"))
    }

    /// GET a CSV document. `sanitize`, when given, is applied to every line first.
    pub async fn get_csv(
        &self,
        url: &str,
        query: &[(&str, &str)],
        sanitize: Option<fn(&str) -> String>,
    ) -> Result<CsvTable> {
        let body = self.get_text(url, query).await?;
        let body = match sanitize {
            Some(f) => body.lines().map(f).collect::<Vec<_>>().join("\n"),
            None => body,
        };
        CsvTable::parse(&body).with_context(|| format!("Failed to parse CSV from {url}"))
    }
}

/// Keeps only the characters that occur in the astronomy CSV headers and values,
/// dropping the bilingual column captions.
pub fn sanitize_astronomy_line(line: &str) -> String {
    line.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-' | ','))
        .collect()
}

/// A CSV document addressed by header name.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers().context("Missing CSV header row")?.clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .context("Malformed CSV record")?;

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().map(move |record| CsvRow { table: self, record })
    }

    /// First row whose `column` equals `value`.
    pub fn find_row(&self, column: &str, value: &str) -> Option<CsvRow<'_>> {
        let idx = self.column(column)?;
        self.rows()
            .find(|row| row.record.get(idx).is_some_and(|v| v == value))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    table: &'a CsvTable,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    /// Field under `column`; empty for missing columns or short rows.
    pub fn value(&self, column: &str) -> &'a str {
        self.table
            .column(column)
            .and_then(|idx| self.record.get(idx))
            .unwrap_or("")
    }

    /// Numeric field; `None` for blanks and markers such as `N/A`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.value(column).parse().ok()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPERATURE_CSV: &str = "\u{feff}Date time,Automatic Weather Station,Air Temperature(degree Celsius)\n\
        202310181540,Hong Kong Observatory,27.9\n\
        202310181540,Sha Tin,N/A\n";

    #[test]
    fn finds_rows_by_header() {
        let table = CsvTable::parse(TEMPERATURE_CSV).unwrap();
        assert_eq!(table.len(), 2);

        let row = table
            .find_row("Automatic Weather Station", "Hong Kong Observatory")
            .unwrap();
        assert_eq!(row.number("Air Temperature(degree Celsius)"), Some(27.9));
        assert_eq!(row.value("Date time"), "202310181540");
    }

    #[test]
    fn non_numeric_values_are_none() {
        let table = CsvTable::parse(TEMPERATURE_CSV).unwrap();
        let row = table.find_row("Automatic Weather Station", "Sha Tin").unwrap();
        assert_eq!(row.number("Air Temperature(degree Celsius)"), None);
        assert_eq!(row.value("No such column"), "");
    }

    #[test]
    fn missing_station_or_column_is_none() {
        let table = CsvTable::parse(TEMPERATURE_CSV).unwrap();
        assert!(table.find_row("Automatic Weather Station", "Atlantis").is_none());
        assert!(table.find_row("Station", "Sha Tin").is_none());
    }

    #[test]
    fn sanitizer_strips_captions() {
        assert_eq!(sanitize_astronomy_line("日期 YYYY-MM-DD,出 RISE,中天 TRAN.,日落 SET"), "YYYY-MM-DD,RISE,TRAN.,SET");
        assert_eq!(sanitize_astronomy_line("2023-10-18,06:19,12:01,17:44"), "2023-10-18,06:19,12:01,17:44");
    }

    #[test]
    fn truncates_long_bodies_on_char_boundary() {
        let body = "天".repeat(100);
        let t = truncate_body(&body);
        assert!(t.ends_with("..."));
        assert!(t.len() <= 203);
    }
}
