use crate::calc::{parse_epiweek, week_start};
use crate::data::{Persistable, RecordData};
use anyhow::Result;

pub fn run() -> Result<()> {
    let record_data = RecordData::load()?;
    write_records(&record_data, &mut std::io::stdout())
}

pub(crate) fn write_records<W: std::io::Write>(data: &RecordData, out: &mut W) -> Result<()> {
    writeln!(out, "Records")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<10} {:<12} {}", "Epiweek", "Starts", "Recorded")?;
    for r in &data.records {
        let starts = parse_epiweek(&r.epiweek)
            .ok()
            .and_then(|(year, week)| week_start(year, week))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {:<10} {:<12} {}",
            r.epiweek,
            starts,
            r.recorded_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} record(s)", data.records.len())?;
    Ok(())
}
