pub mod app_settings;
pub mod persistence;
pub mod record;

pub use app_settings::AppSettings;
pub use persistence::Persistable;
pub use record::{Record, RecordData, SummaryEntry};
