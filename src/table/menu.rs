use crate::table::cell::{EMPTY_TEXT, VALIDATED_TEXT};
use crate::table::grid::{CellRef, Grid};
use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Add,
    Update,
    Delete,
    /// Listed for interface parity; selecting it changes nothing.
    Replace,
}

pub const MENU_ITEMS: [MenuAction; 4] = [
    MenuAction::Add,
    MenuAction::Update,
    MenuAction::Delete,
    MenuAction::Replace,
];

impl MenuAction {
    pub fn key(self) -> &'static str {
        match self {
            MenuAction::Add => "add",
            MenuAction::Update => "update",
            MenuAction::Delete => "delete",
            MenuAction::Replace => "replace",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Add => "Add IDSR data",
            MenuAction::Update => "Update IDSR data",
            MenuAction::Delete => "Delete IDSR data",
            MenuAction::Replace => "Add external pop. data",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MenuAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.to_ascii_lowercase();
        MENU_ITEMS
            .iter()
            .copied()
            .find(|a| a.key() == key)
            .ok_or_else(|| format!("unknown menu action '{}' (add, update, delete, replace)", s))
    }
}

/// Collaborators the menu hands work to. Calls are fire-and-forget: an error
/// is logged and the cell stays Pending until the next resync.
pub trait RecordActions {
    fn delete_record(&mut self, epiweek: &str) -> Result<()>;
    fn open_add_form(&mut self, control_id: &str, cell: &CellRef) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    Applied,
    /// The cell's content did not allow the action.
    Guarded,
    NotImplemented,
}

/// Runs one menu selection against `cell`. Guards compare the cell's
/// displayed content: only `.` is addable, only `X` is updatable or deletable.
pub fn dispatch(
    grid: &mut Grid,
    cell: &CellRef,
    action: MenuAction,
    control_id: &str,
    actions: &mut dyn RecordActions,
) -> MenuOutcome {
    let status = match grid.cell(cell) {
        Some(view) => view.text(),
        None => return MenuOutcome::Guarded,
    };

    match action {
        MenuAction::Add if status == EMPTY_TEXT => {
            mark_pending(grid, cell);
            fire("open_add_form", actions.open_add_form(control_id, cell));
            MenuOutcome::Applied
        }
        MenuAction::Update if status == VALIDATED_TEXT => {
            mark_pending(grid, cell);
            fire("delete_record", actions.delete_record(&cell.epiweek));
            mark_pending(grid, cell);
            fire("open_add_form", actions.open_add_form(control_id, cell));
            MenuOutcome::Applied
        }
        MenuAction::Delete if status == VALIDATED_TEXT => {
            mark_pending(grid, cell);
            fire("delete_record", actions.delete_record(&cell.epiweek));
            MenuOutcome::Applied
        }
        MenuAction::Replace => {
            info!(cell = %cell.id, "replace is not implemented");
            MenuOutcome::NotImplemented
        }
        _ => MenuOutcome::Guarded,
    }
}

fn mark_pending(grid: &mut Grid, cell: &CellRef) {
    if let Some(view) = grid.cell_mut(cell) {
        view.mark_pending();
    }
}

fn fire(call: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(call, error = %e, "collaborator call failed; cell stays pending");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::SummaryEntry;
    use crate::table::cell::CellState;
    use crate::table::grid::render;

    /// Records every collaborator call in order.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub calls: Vec<String>,
        pub fail: bool,
    }

    impl RecordActions for Recorder {
        fn delete_record(&mut self, epiweek: &str) -> Result<()> {
            self.calls.push(format!("delete:{}", epiweek));
            if self.fail {
                anyhow::bail!("store offline");
            }
            Ok(())
        }

        fn open_add_form(&mut self, control_id: &str, cell: &CellRef) -> Result<()> {
            self.calls.push(format!("form:{}:{}", control_id, cell.epiweek));
            Ok(())
        }
    }

    fn grid_with(epiweeks: &[&str]) -> Grid {
        let mut grid = render("table", 2021, 2021);
        let summary: Vec<_> = epiweeks.iter().map(|e| SummaryEntry::new(e)).collect();
        grid.reconcile(&summary);
        grid
    }

    #[test]
    fn test_add_on_empty_goes_pending_and_opens_form() {
        let mut grid = grid_with(&[]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        let out = dispatch(&mut grid, &cell, MenuAction::Add, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::Applied);
        assert_eq!(grid.cell(&cell).unwrap().text(), "...");
        assert_eq!(rec.calls, vec!["form:ds_add:2021-05"]);
    }

    #[test]
    fn test_add_on_validated_is_guarded() {
        let mut grid = grid_with(&["2021-05"]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        let out = dispatch(&mut grid, &cell, MenuAction::Add, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::Guarded);
        assert_eq!(grid.cell(&cell).unwrap().state(), CellState::Validated);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_update_deletes_then_opens_form() {
        let mut grid = grid_with(&["2021-05"]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        let out = dispatch(&mut grid, &cell, MenuAction::Update, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::Applied);
        assert_eq!(grid.cell(&cell).unwrap().state(), CellState::Pending);
        assert_eq!(rec.calls, vec!["delete:2021-05", "form:ds_add:2021-05"]);
    }

    #[test]
    fn test_update_on_empty_is_guarded() {
        let mut grid = grid_with(&[]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        assert_eq!(
            dispatch(&mut grid, &cell, MenuAction::Update, "ds_add", &mut rec),
            MenuOutcome::Guarded
        );
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_delete_on_validated_calls_persistence() {
        let mut grid = grid_with(&["2021-05"]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        dispatch(&mut grid, &cell, MenuAction::Delete, "ds_add", &mut rec);
        assert_eq!(grid.cell(&cell).unwrap().text(), "...");
        assert_eq!(rec.calls, vec!["delete:2021-05"]);
    }

    #[test]
    fn test_delete_on_empty_never_calls_persistence() {
        let mut grid = grid_with(&[]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        let out = dispatch(&mut grid, &cell, MenuAction::Delete, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::Guarded);
        assert_eq!(grid.cell(&cell).unwrap().text(), ".");
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_pending_cell_accepts_nothing() {
        let mut grid = grid_with(&[]);
        let cell = grid.resolve("table-2021-05").unwrap();
        grid.cell_mut(&cell).unwrap().mark_pending();
        let mut rec = Recorder::default();
        for action in MENU_ITEMS {
            let out = dispatch(&mut grid, &cell, action, "ds_add", &mut rec);
            assert_ne!(out, MenuOutcome::Applied);
        }
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_replace_is_inert() {
        let mut grid = grid_with(&["2021-05"]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder::default();
        let out = dispatch(&mut grid, &cell, MenuAction::Replace, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::NotImplemented);
        assert_eq!(grid.cell(&cell).unwrap().state(), CellState::Validated);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_failed_delete_leaves_cell_pending() {
        let mut grid = grid_with(&["2021-05"]);
        let cell = grid.resolve("table-2021-05").unwrap();
        let mut rec = Recorder { fail: true, ..Default::default() };
        let out = dispatch(&mut grid, &cell, MenuAction::Delete, "ds_add", &mut rec);
        assert_eq!(out, MenuOutcome::Applied);
        assert_eq!(grid.cell(&cell).unwrap().state(), CellState::Pending);
    }

    #[test]
    fn test_menu_action_from_str() {
        assert_eq!("add".parse::<MenuAction>().unwrap(), MenuAction::Add);
        assert_eq!("DELETE".parse::<MenuAction>().unwrap(), MenuAction::Delete);
        assert!("paste".parse::<MenuAction>().is_err());
    }

    #[test]
    fn test_menu_labels() {
        assert_eq!(MenuAction::Add.label(), "Add IDSR data");
        assert_eq!(MenuAction::Replace.to_string(), "replace");
    }
}
