use crate::calc::{parse_epiweek, yrwk_to_epiwk, Direction, MAX_YEARS};
use crate::data::{AppSettings, Persistable, Record, RecordData};
use crate::table::{CellRef, InteractiveTable, MenuAction, MenuOutcome, RecordActions};
use anyhow::{bail, Result};
use chrono::{Datelike, Local};
use tracing::info;

/// Expansion steps allowed to bring a far-off epiweek into view.
const MAX_EXPAND: i32 = 100;

/// Store-backed collaborators for a headless action. The add form is
/// answered immediately by recording the epiweek.
struct StoreActions<'r> {
    records: &'r mut RecordData,
}

impl RecordActions for StoreActions<'_> {
    fn delete_record(&mut self, epiweek: &str) -> Result<()> {
        if !self.records.has(epiweek) {
            bail!("no record for {}", epiweek);
        }
        self.records.remove(epiweek);
        Ok(())
    }

    fn open_add_form(&mut self, control_id: &str, cell: &CellRef) -> Result<()> {
        info!(control_id, epiweek = %cell.epiweek, "add form answered from the command line");
        self.records.add(Record::new(&cell.epiweek));
        Ok(())
    }
}

pub fn run(action: MenuAction, epiweek: &str) -> Result<()> {
    let settings = AppSettings::load()?;
    let mut record_data = RecordData::load()?;
    let line = apply_action(&settings, &mut record_data, action, epiweek, Local::now().year())?;
    record_data.save()?;
    println!("{}", line);
    Ok(())
}

/// Opens the menu on the epiweek's cell, selects `action`, then resyncs the
/// table against the updated store. Returns a one-line report.
pub(crate) fn apply_action(
    settings: &AppSettings,
    records: &mut RecordData,
    action: MenuAction,
    epiweek: &str,
    current_year: i32,
) -> Result<String> {
    let (year, week) = parse_epiweek(epiweek)?;
    let epiweek = yrwk_to_epiwk(year, week);

    let mut table = InteractiveTable::load(settings, &records.summary(), current_year);
    let range = table.range();
    if (year - range.max).max(range.min - year) > MAX_EXPAND {
        bail!(
            "{} is more than {} years outside {}-{}",
            epiweek,
            MAX_EXPAND,
            range.min,
            range.max
        );
    }
    // Same as pressing the "+" controls until the year row exists.
    while !table.range().contains(year) {
        let direction = if year < table.range().min {
            Direction::Min
        } else {
            Direction::Max
        };
        let before = table.range();
        table.expand(direction, &records.summary());
        if table.range() == before {
            bail!(
                "{} does not fit in a table of at most {} years ({}-{})",
                epiweek,
                MAX_YEARS,
                before.min,
                before.max
            );
        }
    }

    let cell_id = table.grid().cell_id(year, week);
    let cell = table.show(&cell_id)?;
    let before = cell_text(&table, &cell);
    let outcome = {
        let mut actions = StoreActions { records: &mut *records };
        table.select_at(&cell, action, &mut actions)?
    };
    table.hide();
    let during = cell_text(&table, &cell);

    table.resync(&records.summary());
    let after = cell_text(&table, &cell);

    let verdict = match outcome {
        MenuOutcome::Applied => "applied",
        MenuOutcome::Guarded => "not available",
        MenuOutcome::NotImplemented => "not implemented",
    };
    Ok(format!(
        "{} {}: {} ({} -> {} -> {})",
        action, epiweek, verdict, before, during, after
    ))
}

fn cell_text(table: &InteractiveTable, cell: &CellRef) -> &'static str {
    table.grid().cell(cell).map(|c| c.text()).unwrap_or("-")
}
