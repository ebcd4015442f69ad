//! Sun and moon rise/transit/set times (`SRS` / `MRS`), one CSV per year.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use crate::{
    error::DataError,
    feed::{OPENDATA_PHP, parse_clock_time},
    http::{CsvRow, CsvTable, HkoClient, sanitize_astronomy_line},
    model::{MoonTimes, SunTimes},
};

const DATE_COLUMN: &str = "YYYY-MM-DD";
const RISE_COLUMN: &str = "RISE";
const TRANSIT_COLUMN: &str = "TRAN.";
const SET_COLUMN: &str = "SET";

async fn fetch_year(client: &HkoClient, data_type: &str, year: i32) -> Result<CsvTable> {
    let url = format!("{}{OPENDATA_PHP}", client.endpoints().data);
    let year = year.to_string();
    client
        .get_csv(
            &url,
            &[("dataType", data_type), ("year", year.as_str()), ("rformat", "csv")],
            Some(sanitize_astronomy_line),
        )
        .await
}

fn row_for(table: &CsvTable, date: NaiveDate) -> Result<CsvRow<'_>, DataError> {
    let key = date.format("%Y-%m-%d").to_string();
    table
        .find_row(DATE_COLUMN, &key)
        .ok_or(DataError::Missing("astronomy row for date"))
}

pub fn sun_times_from(table: &CsvTable, date: NaiveDate) -> Result<SunTimes> {
    let row = row_for(table, date)?;
    let required = |column: &'static str| -> Result<_> {
        parse_clock_time(row.value(column))?.ok_or_else(|| DataError::Missing(column).into())
    };

    Ok(SunTimes {
        rise: required(RISE_COLUMN)?,
        transit: required(TRANSIT_COLUMN)?,
        set: required(SET_COLUMN)?,
    })
}

pub fn moon_times_from(table: &CsvTable, date: NaiveDate) -> Result<MoonTimes> {
    let row = row_for(table, date)?;

    Ok(MoonTimes {
        rise: parse_clock_time(row.value(RISE_COLUMN))?,
        transit: parse_clock_time(row.value(TRANSIT_COLUMN))?,
        set: parse_clock_time(row.value(SET_COLUMN))?,
    })
}

pub async fn sun_times(client: &HkoClient, date: NaiveDate) -> Result<SunTimes> {
    let table = fetch_year(client, "SRS", date.year()).await?;
    sun_times_from(&table, date).with_context(|| format!("No sun times for {date}"))
}

pub async fn moon_times(client: &HkoClient, date: NaiveDate) -> Result<MoonTimes> {
    let table = fetch_year(client, "MRS", date.year()).await?;
    moon_times_from(&table, date).with_context(|| format!("No moon times for {date}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn table(raw: &str) -> CsvTable {
        let cleaned: Vec<String> = raw.lines().map(sanitize_astronomy_line).collect();
        CsvTable::parse(&cleaned.join("\n")).unwrap()
    }

    fn oct(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, day).unwrap()
    }

    #[test]
    fn sun_times_for_day() {
        let t = table("日期 YYYY-MM-DD,日出 RISE,中天 TRAN.,日落 SET\n2023-10-18,06:19,12:01,17:44\n");
        let sun = sun_times_from(&t, oct(18)).unwrap();
        assert_eq!(sun.rise, NaiveTime::from_hms_opt(6, 19, 0).unwrap());
        assert_eq!(sun.set, NaiveTime::from_hms_opt(17, 44, 0).unwrap());
    }

    #[test]
    fn missing_day_is_error() {
        let t = table("YYYY-MM-DD,RISE,TRAN.,SET\n2023-10-18,06:19,12:01,17:44\n");
        assert!(sun_times_from(&t, oct(19)).is_err());
        assert!(moon_times_from(&t, oct(19)).is_err());
    }

    #[test]
    fn moon_events_may_be_absent() {
        let t = table("YYYY-MM-DD,RISE,TRAN.,SET\n2023-10-18,,05:12,17:30\n");
        let moon = moon_times_from(&t, oct(18)).unwrap();
        assert_eq!(moon.rise, None);
        assert_eq!(moon.transit, NaiveTime::from_hms_opt(5, 12, 0));
    }

    #[test]
    fn sun_events_are_required() {
        let t = table("YYYY-MM-DD,RISE,TRAN.,SET\n2023-10-18,06:19,,17:44\n");
        assert!(sun_times_from(&t, oct(18)).is_err());
    }
}
