use crate::data::{AppSettings, Persistable, RecordData};
use crate::ui::grid_view::{run_app, App};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::Local;
use tracing::info;

pub fn run() -> Result<()> {
    let settings = AppSettings::load()?;
    let mut record_data = RecordData::load()?;
    info!(records = record_data.records.len(), "starting interactive table");

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;

    let today = Local::now().date_naive();
    let mut app = App::new(&mut record_data, &settings, today);

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    drop(app);

    record_data.save()?;
    info!(records = record_data.records.len(), "saved records");

    result
}
