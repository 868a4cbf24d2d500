pub mod cell;
pub mod error;
pub mod grid;
pub mod html;
pub mod menu;

pub use cell::{CellState, CellView, Marker};
pub use error::TableError;
pub use grid::{render, CellRef, Grid, ReconcileReport};
pub use menu::{MenuAction, MenuOutcome, RecordActions, MENU_ITEMS};

use crate::calc::{initialize_year_range, yrwk_to_epiwk, Direction, YearRange, MAX_YEARS};
use crate::data::{AppSettings, SummaryEntry};
use std::collections::HashSet;
use tracing::{debug, warn};

/// The interactive epiweek table: the grid plus the menu session around it.
pub struct InteractiveTable {
    grid: Grid,
    add_form_control: String,
    /// Cell the context menu is currently open on.
    menu: Option<CellRef>,
    /// Most recently acted-on cell.
    last_interaction: Option<CellRef>,
}

impl InteractiveTable {
    pub fn new(settings: &AppSettings, range: YearRange) -> Self {
        InteractiveTable {
            grid: Grid::new(&settings.target, range),
            add_form_control: settings.add_form_control.clone(),
            menu: None,
            last_interaction: None,
        }
    }

    /// Sizes the year range from the summary, renders, and reconciles.
    pub fn load(settings: &AppSettings, summary: &[SummaryEntry], current_year: i32) -> Self {
        let range = initialize_year_range(summary, current_year);
        let mut table = Self::new(settings, range);
        table.reconcile(summary);
        table
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn range(&self) -> YearRange {
        self.grid.range()
    }

    pub fn target(&self) -> &str {
        self.grid.target()
    }

    pub fn open_menu(&self) -> Option<&CellRef> {
        self.menu.as_ref()
    }

    pub fn last_interaction(&self) -> Option<&CellRef> {
        self.last_interaction.as_ref()
    }

    pub fn reconcile(&mut self, summary: &[SummaryEntry]) -> ReconcileReport {
        self.grid.reconcile(summary)
    }

    /// The signal that an external add/update/delete has finished: closes
    /// the menu, clears every cell the summary no longer names, and
    /// reconciles.
    pub fn resync(&mut self, summary: &[SummaryEntry]) -> ReconcileReport {
        self.hide();
        let named: HashSet<&str> = summary.iter().map(|e| e.epiweek.as_str()).collect();
        let stale: Vec<(i32, u32)> = self
            .grid
            .iter()
            .filter(|(_, cell)| cell.state() != CellState::Empty)
            .filter(|((year, week), _)| !named.contains(yrwk_to_epiwk(*year, *week).as_str()))
            .map(|(key, _)| key)
            .collect();
        for (year, week) in stale {
            debug!(year, week, "clearing cell absent from records");
            self.grid.clear(year, week);
        }
        self.grid.reconcile(summary)
    }

    /// Grows the range by one year, then rebuilds and reconciles. A range
    /// already `MAX_YEARS` wide is left as is.
    pub fn expand(&mut self, direction: Direction, summary: &[SummaryEntry]) -> ReconcileReport {
        let mut range = self.grid.range();
        if range.len() >= MAX_YEARS {
            warn!(min = range.min, max = range.max, "year range at its limit, not expanding");
            self.hide();
            return self.grid.reconcile(summary);
        }
        range.expand(direction);
        debug!(?direction, min = range.min, max = range.max, "expanding year range");
        self.grid = render(self.grid.target(), range.min, range.max);
        self.menu = None;
        self.grid.reconcile(summary)
    }

    /// Opens the context menu on a cell and highlights it.
    pub fn show(&mut self, cell_id: &str) -> Result<CellRef, TableError> {
        let cell = self.grid.resolve(cell_id)?;
        self.hide();
        if let Some(view) = self.grid.cell_mut(&cell) {
            view.highlight();
        }
        self.menu = Some(cell.clone());
        Ok(cell)
    }

    /// Closes the context menu, restoring the cell's markers.
    pub fn hide(&mut self) {
        if let Some(cell) = self.menu.take() {
            if let Some(view) = self.grid.cell_mut(&cell) {
                view.unhighlight();
            }
        }
    }

    /// Applies a menu item to the cell the menu is open on.
    pub fn select(
        &mut self,
        action: MenuAction,
        actions: &mut dyn RecordActions,
    ) -> Result<MenuOutcome, TableError> {
        let cell = self.menu.clone().ok_or_else(|| TableError::StaleSessionState {
            open: None,
            requested: action.key().to_string(),
        })?;
        self.apply(cell, action, actions)
    }

    /// As [`select`](Self::select), but the caller names the cell; it must be
    /// the one the menu is open on.
    pub fn select_at(
        &mut self,
        cell: &CellRef,
        action: MenuAction,
        actions: &mut dyn RecordActions,
    ) -> Result<MenuOutcome, TableError> {
        if self.menu.as_ref() != Some(cell) {
            return Err(TableError::StaleSessionState {
                open: self.menu.as_ref().map(|c| c.id.clone()),
                requested: cell.id.clone(),
            });
        }
        self.apply(cell.clone(), action, actions)
    }

    fn apply(
        &mut self,
        cell: CellRef,
        action: MenuAction,
        actions: &mut dyn RecordActions,
    ) -> Result<MenuOutcome, TableError> {
        debug!(cell = %cell.id, epiweek = %cell.epiweek, %action, "menu selection");
        self.last_interaction = Some(cell.clone());
        Ok(menu::dispatch(
            &mut self.grid,
            &cell,
            action,
            &self.add_form_control,
            actions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::menu::tests::Recorder;

    fn summary(epiweeks: &[&str]) -> Vec<SummaryEntry> {
        epiweeks.iter().map(|e| SummaryEntry::new(e)).collect()
    }

    fn table(epiweeks: &[&str]) -> InteractiveTable {
        InteractiveTable::load(&AppSettings::default(), &summary(epiweeks), 2026)
    }

    #[test]
    fn test_load_sizes_range_from_records() {
        let t = table(&["2019-10", "2021-03"]);
        assert_eq!(t.range(), YearRange::new(2019, 2021));
        assert_eq!(t.grid().len(), 3 * 53);
        assert_eq!(t.grid().get(2021, 3).unwrap().text(), "X");
    }

    #[test]
    fn test_load_empty_uses_current_year() {
        let t = table(&[]);
        assert_eq!(t.range(), YearRange::single(2026));
        assert!(t.grid().iter().all(|(_, c)| c.text() == "."));
    }

    #[test]
    fn test_expand_min_adds_row_and_revalidates() {
        let records = summary(&["2020-07", "2021-03"]);
        let mut t = InteractiveTable::new(&AppSettings::default(), YearRange::single(2021));
        let first = t.reconcile(&records);
        assert_eq!(first.unknown, vec!["2020-07"]);

        let report = t.expand(Direction::Min, &records);
        assert_eq!(t.range(), YearRange::new(2020, 2021));
        assert_eq!(t.grid().len(), 2 * 53);
        assert!(report.unknown.is_empty());
        assert_eq!(t.grid().get(2020, 7).unwrap().text(), "X");
        assert_eq!(t.grid().get(2021, 3).unwrap().text(), "X");
    }

    #[test]
    fn test_expand_max_leaves_min() {
        let mut t = table(&["2021-03"]);
        t.expand(Direction::Max, &summary(&["2021-03"]));
        assert_eq!(t.range(), YearRange::new(2021, 2022));
    }

    #[test]
    fn test_show_and_hide_toggle_highlight() {
        let mut t = table(&["2021-03"]);
        t.show("table-2021-03").unwrap();
        let cell = t.grid().get(2021, 3).unwrap();
        assert!(cell.has_marker(Marker::Clicked));
        assert!(!cell.has_marker(Marker::Validated));
        t.hide();
        let cell = t.grid().get(2021, 3).unwrap();
        assert!(!cell.has_marker(Marker::Clicked));
        assert!(cell.has_marker(Marker::Validated));
        assert!(t.open_menu().is_none());
    }

    #[test]
    fn test_show_unknown_cell_errors() {
        let mut t = table(&["2021-03"]);
        assert!(matches!(
            t.show("table-1999-03"),
            Err(TableError::UnknownCellReference(_))
        ));
    }

    #[test]
    fn test_show_moves_highlight_between_cells() {
        let mut t = table(&["2021-03"]);
        t.show("table-2021-03").unwrap();
        t.show("table-2021-04").unwrap();
        assert!(t.grid().get(2021, 3).unwrap().has_marker(Marker::Validated));
        assert!(t.grid().get(2021, 4).unwrap().has_marker(Marker::Clicked));
    }

    #[test]
    fn test_select_records_last_interaction() {
        let mut t = table(&["2021-03"]);
        let mut rec = Recorder::default();
        t.show("table-2021-03").unwrap();
        let out = t.select(MenuAction::Delete, &mut rec).unwrap();
        t.hide();
        assert_eq!(out, MenuOutcome::Applied);
        let last = t.last_interaction().unwrap();
        assert_eq!(last.id, "table-2021-03");
        assert_eq!((last.year, last.week), (2021, 3));
        assert_eq!(last.epiweek, "2021-03");
        let cell = t.grid().get(2021, 3).unwrap();
        assert_eq!(cell.text(), "...");
        assert!(!cell.has_marker(Marker::Clicked));
    }

    #[test]
    fn test_select_without_open_menu_is_stale() {
        let mut t = table(&["2021-03"]);
        let mut rec = Recorder::default();
        let err = t.select(MenuAction::Delete, &mut rec).unwrap_err();
        assert!(matches!(err, TableError::StaleSessionState { open: None, .. }));
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_select_at_other_cell_is_stale() {
        let mut t = table(&["2021-03", "2021-04"]);
        let mut rec = Recorder::default();
        let other = t.grid().resolve("table-2021-04").unwrap();
        t.show("table-2021-03").unwrap();
        let err = t.select_at(&other, MenuAction::Delete, &mut rec).unwrap_err();
        assert_eq!(
            err,
            TableError::StaleSessionState {
                open: Some("table-2021-03".to_string()),
                requested: "table-2021-04".to_string(),
            }
        );
        assert!(rec.calls.is_empty());
        assert_eq!(t.grid().get(2021, 4).unwrap().text(), "X");
    }

    #[test]
    fn test_select_at_open_cell_applies() {
        let mut t = table(&[]);
        let mut rec = Recorder::default();
        let cell = t.show("table-2026-10").unwrap();
        let out = t.select_at(&cell, MenuAction::Add, &mut rec).unwrap();
        assert_eq!(out, MenuOutcome::Applied);
        assert_eq!(rec.calls, vec!["form:ds_add:2026-10"]);
    }

    #[test]
    fn test_resync_resolves_pending_cells() {
        let mut t = table(&["2021-03", "2021-04"]);
        let mut rec = Recorder::default();
        t.show("table-2021-03").unwrap();
        t.select(MenuAction::Delete, &mut rec).unwrap();
        t.hide();
        t.show("table-2021-04").unwrap();
        t.select(MenuAction::Delete, &mut rec).unwrap();
        t.hide();

        // 2021-03 was deleted, the 2021-04 delete never happened
        t.resync(&summary(&["2021-04"]));
        assert_eq!(t.grid().get(2021, 3).unwrap().state(), CellState::Empty);
        assert_eq!(t.grid().get(2021, 4).unwrap().state(), CellState::Validated);
    }

    #[test]
    fn test_resync_clears_validated_cells_missing_from_records() {
        let mut t = table(&["2021-03", "2021-04"]);
        t.show("table-2021-04").unwrap();
        let report = t.resync(&summary(&["2021-04"]));
        assert_eq!(report.validated, 1);
        assert_eq!(t.grid().get(2021, 3).unwrap().state(), CellState::Empty);
        let kept = t.grid().get(2021, 4).unwrap();
        assert_eq!(kept.state(), CellState::Validated);
        assert!(!kept.has_marker(Marker::Clicked));
        assert!(t.open_menu().is_none());
        assert_eq!(t.grid().iter().filter(|(_, c)| c.text() == "X").count(), 1);
    }

    #[test]
    fn test_expand_stops_at_year_limit() {
        let records = summary(&["1900-01", "2099-01"]);
        let mut t = InteractiveTable::load(&AppSettings::default(), &records, 2026);
        assert_eq!(t.range().len(), MAX_YEARS);
        t.expand(Direction::Min, &records);
        t.expand(Direction::Max, &records);
        assert_eq!(t.range(), YearRange::new(1900, 2099));
        assert_eq!(t.grid().get(1900, 1).unwrap().text(), "X");
    }

    #[test]
    fn test_expand_closes_open_menu() {
        let mut t = table(&["2021-03"]);
        t.show("table-2021-03").unwrap();
        t.expand(Direction::Min, &summary(&["2021-03"]));
        assert!(t.open_menu().is_none());
        assert!(t.grid().get(2021, 3).unwrap().has_marker(Marker::Validated));
    }
}
