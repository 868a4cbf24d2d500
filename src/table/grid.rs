use crate::calc::{parse_epiweek, yrwk_to_epiwk, YearRange, FIRST_WEEK, LAST_WEEK};
use crate::data::SummaryEntry;
use crate::table::cell::CellView;
use crate::table::TableError;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Identity of the cell a menu action applies to, resolved once from its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRef {
    pub id: String,
    pub year: i32,
    pub week: u32,
    pub epiweek: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub validated: usize,
    /// Summary epiweeks with no rendered cell.
    pub unknown: Vec<String>,
}

/// Composite id of a cell: `{target}-{year}-{week:02}`.
pub fn cell_id(target: &str, year: i32, week: u32) -> String {
    format!("{}-{}", target, yrwk_to_epiwk(year, week))
}

/// The dense year x week table for one target container.
#[derive(Clone, Debug)]
pub struct Grid {
    target: String,
    range: YearRange,
    cells: BTreeMap<(i32, u32), CellView>,
}

impl Grid {
    /// Builds a fresh grid with every cell Empty. Spans wider than
    /// `MAX_YEARS` keep their earliest years.
    pub fn new(target: &str, range: YearRange) -> Self {
        let range = range.limit(range.min);
        let mut cells = BTreeMap::new();
        for year in range.years() {
            for week in FIRST_WEEK..=LAST_WEEK {
                cells.insert((year, week), CellView::default());
            }
        }
        Grid {
            target: target.to_string(),
            range,
            cells,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    pub fn cell_id(&self, year: i32, week: u32) -> String {
        cell_id(&self.target, year, week)
    }

    pub fn get(&self, year: i32, week: u32) -> Option<&CellView> {
        self.cells.get(&(year, week))
    }

    pub fn get_mut(&mut self, year: i32, week: u32) -> Option<&mut CellView> {
        self.cells.get_mut(&(year, week))
    }

    pub fn cell(&self, cell: &CellRef) -> Option<&CellView> {
        self.get(cell.year, cell.week)
    }

    pub fn cell_mut(&mut self, cell: &CellRef) -> Option<&mut CellView> {
        self.get_mut(cell.year, cell.week)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i32, u32), &CellView)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    /// Resolves a canonical epiweek to a rendered cell.
    pub fn locate(&self, epiweek: &str) -> Result<CellRef, TableError> {
        let id = format!("{}-{}", self.target, epiweek);
        let (year, week) =
            parse_epiweek(epiweek).map_err(|_| TableError::UnknownCellReference(id.clone()))?;
        // Only the canonical spelling names a cell ("2021-3" does not).
        if yrwk_to_epiwk(year, week) != epiweek || !self.cells.contains_key(&(year, week)) {
            return Err(TableError::UnknownCellReference(id));
        }
        Ok(CellRef {
            id,
            year,
            week,
            epiweek: epiweek.to_string(),
        })
    }

    /// Resolves a composite cell id (`{target}-{year}-{week:02}`).
    pub fn resolve(&self, id: &str) -> Result<CellRef, TableError> {
        let epiweek = id
            .strip_prefix(self.target.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| TableError::InvalidCellId(id.to_string()))?;
        parse_epiweek(epiweek).map_err(|_| TableError::InvalidCellId(id.to_string()))?;
        self.locate(epiweek)
    }

    /// Forces every summary cell to Validated. Entries without a rendered
    /// cell are reported and skipped.
    pub fn reconcile(&mut self, summary: &[SummaryEntry]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for entry in summary {
            match self.locate(&entry.epiweek) {
                Ok(cell) => {
                    if let Some(view) = self.cell_mut(&cell) {
                        view.validate();
                        report.validated += 1;
                    }
                }
                Err(e) => {
                    warn!(target_grid = %self.target, error = %e, "reconcile skipped record");
                    report.unknown.push(entry.epiweek.clone());
                }
            }
        }
        debug!(
            validated = report.validated,
            unknown = report.unknown.len(),
            "reconciled grid"
        );
        report
    }

    /// Returns a cell to Empty; false when no such cell is rendered.
    pub fn clear(&mut self, year: i32, week: u32) -> bool {
        match self.get_mut(year, week) {
            Some(cell) => {
                cell.clear();
                true
            }
            None => false,
        }
    }
}

/// Builds the grid for `target` over `[year_min, year_max]`. An inverted
/// range yields a grid without data rows.
pub fn render(target: &str, year_min: i32, year_max: i32) -> Grid {
    let range = YearRange::new(year_min, year_max);
    if let Err(e) = range.check() {
        warn!(target_grid = target, error = %e, "rendering grid without data rows");
    }
    Grid::new(target, range)
}
