use crate::data::persistence::Persistable;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One persisted surveillance dataset, keyed by its epiweek.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Record {
    pub epiweek: String,
    pub recorded_at: NaiveDateTime,
}

impl Record {
    pub fn new(epiweek: &str) -> Self {
        Record {
            epiweek: epiweek.to_string(),
            recorded_at: Local::now().naive_local(),
        }
    }
}

/// The read-only view of a record handed to the table: only the epiweek matters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SummaryEntry {
    pub epiweek: String,
}

impl SummaryEntry {
    pub fn new(epiweek: &str) -> Self {
        SummaryEntry {
            epiweek: epiweek.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct RecordData {
    #[serde(rename = "recordsum")]
    pub records: Vec<Record>,
}

impl Persistable for RecordData {
    fn filename() -> &'static str {
        "records.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl RecordData {
    pub fn has(&self, epiweek: &str) -> bool {
        self.records.iter().any(|r| r.epiweek == epiweek)
    }

    /// Adds a record, replacing any existing record for the same epiweek.
    pub fn add(&mut self, record: Record) {
        self.remove(&record.epiweek);
        self.records.push(record);
        self.records.sort_by(|a, b| a.epiweek.cmp(&b.epiweek));
    }

    pub fn remove(&mut self, epiweek: &str) {
        self.records.retain(|r| r.epiweek != epiweek);
    }

    pub fn summary(&self) -> Vec<SummaryEntry> {
        self.records
            .iter()
            .map(|r| SummaryEntry::new(&r.epiweek))
            .collect()
    }
}
