use crate::calc::initialize_year_range;
use crate::data::{AppSettings, Persistable, RecordData, SummaryEntry};
use crate::table::html::{render_page, table_markup};
use crate::table::render;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use std::fs;
use std::path::Path;
use tracing::info;

pub struct RenderOptions {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Emit only the table fragment instead of a standalone page.
    pub fragment: bool,
}

pub fn run(out: Option<&Path>, options: &RenderOptions) -> Result<()> {
    let settings = AppSettings::load()?;
    let record_data = RecordData::load()?;
    let html = render_html(
        &settings,
        &record_data.summary(),
        options,
        Local::now().year(),
    );
    match out {
        Some(path) => {
            fs::write(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote grid html");
        }
        None => println!("{}", html),
    }
    Ok(())
}

pub(crate) fn render_html(
    settings: &AppSettings,
    summary: &[SummaryEntry],
    options: &RenderOptions,
    current_year: i32,
) -> String {
    let derived = initialize_year_range(summary, current_year);
    let year_min = options.year_min.unwrap_or(derived.min);
    let year_max = options.year_max.unwrap_or(derived.max);

    let mut grid = render(&settings.target, year_min, year_max);
    grid.reconcile(summary);

    if options.fragment {
        table_markup(&grid).into_string()
    } else {
        render_page(&grid).into_string()
    }
}
