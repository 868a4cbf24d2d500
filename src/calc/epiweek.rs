use crate::table::TableError;
use chrono::{NaiveDate, Weekday};

pub const FIRST_WEEK: u32 = 1;
pub const LAST_WEEK: u32 = 53;

/// Formats a (year, week) pair as a canonical `YYYY-WW` epiweek id.
pub fn yrwk_to_epiwk(year: i32, week: u32) -> String {
    format!("{}-{:02}", year, week)
}

/// Zero-padded two digit week label, as used in column headers and cell ids.
pub fn week_label(week: u32) -> String {
    format!("{:02}", week)
}

/// Year portion of an epiweek: everything before the first `-`, parsed as an integer.
pub fn epiweek_year(epiweek: &str) -> Result<i32, TableError> {
    let year = epiweek.split('-').next().unwrap_or_default();
    year.parse::<i32>()
        .map_err(|_| TableError::InvalidEpiweek(epiweek.to_string()))
}

/// Splits a `YYYY-WW` epiweek into its year and week. The week must lie in [1, 53].
pub fn parse_epiweek(epiweek: &str) -> Result<(i32, u32), TableError> {
    let invalid = || TableError::InvalidEpiweek(epiweek.to_string());
    let (year, week) = epiweek.split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let week = week.parse::<u32>().map_err(|_| invalid())?;
    if !(FIRST_WEEK..=LAST_WEEK).contains(&week) {
        return Err(invalid());
    }
    Ok((year, week))
}

/// Monday of the ISO week, or None for week 53 in years that only have 52.
pub fn week_start(year: i32, week: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}
