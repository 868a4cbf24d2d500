#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("invalid year range: {min} > {max}")]
    InvalidRange { min: i32, max: i32 },
    #[error("invalid epiweek '{0}' (expected YYYY-WW)")]
    InvalidEpiweek(String),
    #[error("invalid cell id '{0}'")]
    InvalidCellId(String),
    #[error("no rendered cell for '{0}'")]
    UnknownCellReference(String),
    #[error("menu is open on {open:?}, action requested for '{requested}'")]
    StaleSessionState {
        open: Option<String>,
        requested: String,
    },
}
