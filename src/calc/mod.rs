pub mod epiweek;
pub mod year_range;

pub use epiweek::{parse_epiweek, week_label, week_start, yrwk_to_epiwk, FIRST_WEEK, LAST_WEEK};
pub use year_range::{initialize_year_range, Direction, YearRange, MAX_YEARS};
