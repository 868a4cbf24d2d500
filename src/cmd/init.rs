use crate::data::{AppSettings, Persistable, Record, RecordData};
use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)?;
    run_in_dir(&dir)?;
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes all default data files into `dir`. Exposed for unit testing.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    AppSettings::default().save_to(dir)?;
    write_records(dir)?;
    Ok(())
}

fn write_records(dir: &Path) -> Result<()> {
    let mut data = RecordData::default();
    for epiweek in default_epiweeks() {
        data.add(Record::new(epiweek));
    }
    data.save_to(dir)
}

fn default_epiweeks() -> [&'static str; 2] {
    ["2021-03", "2021-40"]
}
