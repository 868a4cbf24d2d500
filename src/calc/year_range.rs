use crate::calc::epiweek::epiweek_year;
use crate::data::SummaryEntry;
use crate::table::TableError;
use std::ops::RangeInclusive;
use tracing::warn;

/// Most year rows a grid holds.
pub const MAX_YEARS: usize = 200;

/// Which end of the year span to grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Prepend an earlier year.
    Min,
    /// Append a later year.
    Max,
}

/// Inclusive span of years shown by the grid. `min > max` is allowed and
/// renders as a grid without data rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        YearRange { min, max }
    }

    pub fn single(year: i32) -> Self {
        YearRange { min: year, max: year }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    /// Number of year rows; zero for an inverted range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.max) - i64::from(self.min) + 1) as usize
        }
    }

    pub fn check(&self) -> Result<(), TableError> {
        if self.is_empty() {
            return Err(TableError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn expand(&mut self, direction: Direction) {
        match direction {
            Direction::Min => self.min = self.min.saturating_sub(1),
            Direction::Max => self.max = self.max.saturating_add(1),
        }
    }

    /// Narrows a span wider than [`MAX_YEARS`] to a window of that many
    /// years placed as close to `anchor` as the span allows.
    pub fn limit(self, anchor: i32) -> Self {
        if self.len() <= MAX_YEARS {
            return self;
        }
        let span = MAX_YEARS as i32 - 1;
        let anchor = anchor.clamp(self.min, self.max);
        let min = anchor.saturating_sub(span / 2).max(self.min);
        let max = min.saturating_add(span).min(self.max);
        let limited = YearRange::new(max - span, max);
        warn!(
            min = self.min,
            max = self.max,
            shown_min = limited.min,
            shown_max = limited.max,
            "year range too wide, limiting rows"
        );
        limited
    }
}

/// Derives the year span from the record summary: min and max of the year
/// portion of every epiweek. Falls back to `current_year` when the summary
/// holds no usable entry.
pub fn initialize_year_range(summary: &[SummaryEntry], current_year: i32) -> YearRange {
    let mut bounds: Option<(i32, i32)> = None;
    for entry in summary {
        let year = match epiweek_year(&entry.epiweek) {
            Ok(y) => y,
            Err(e) => {
                warn!(error = %e, "skipping record while sizing year range");
                continue;
            }
        };
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(year), hi.max(year)),
            None => (year, year),
        });
    }
    match bounds {
        Some((min, max)) => YearRange::new(min, max).limit(current_year),
        None => YearRange::single(current_year),
    }
}
