use crate::calc::{week_label, week_start, yrwk_to_epiwk, Direction, FIRST_WEEK, LAST_WEEK};
use crate::data::{AppSettings, Record, RecordData};
use crate::table::{
    CellRef, CellState, CellView, InteractiveTable, Marker, MenuAction, MenuOutcome,
    RecordActions, MENU_ITEMS,
};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io::Stdout;
use std::time::Duration as StdDuration;

const ROW_HEADER_WIDTH: u16 = 6;
const CELL_WIDTH: u16 = 3;
const MENU_WIDTH: u16 = 30;

// Marker colors
const VALIDATED_BG: Color = Color::Rgb(144, 195, 212);
const UPDATING_BG: Color = Color::Rgb(242, 209, 107);

#[derive(PartialEq, Debug)]
enum Mode {
    Normal,
    Menu,
    Form,
}

/// What a mouse click landed on.
#[derive(PartialEq, Debug)]
enum Hit {
    Cell(i32, u32),
    AddEarlier,
    AddLater,
}

/// Persistence and add-form collaborators for the terminal session.
struct SessionActions<'r> {
    records: &'r mut RecordData,
    form: &'r mut Option<CellRef>,
}

impl RecordActions for SessionActions<'_> {
    fn delete_record(&mut self, epiweek: &str) -> Result<()> {
        self.records.remove(epiweek);
        Ok(())
    }

    fn open_add_form(&mut self, _control_id: &str, cell: &CellRef) -> Result<()> {
        *self.form = Some(cell.clone());
        Ok(())
    }
}

pub struct App<'a> {
    table: InteractiveTable,
    records: &'a mut RecordData,
    cursor_year: i32,
    cursor_week: u32,
    mode: Mode,
    menu_index: usize,
    /// Cell the add-record form is open for.
    form: Option<CellRef>,
    /// Result of the last action (message, color). Cleared on next keypress.
    status: Option<(String, Color)>,
    first_week: u32,
    first_year: i32,
    /// Where the grid was last drawn; used to map mouse clicks to cells.
    grid_area: Rect,
}

impl<'a> App<'a> {
    pub fn new(records: &'a mut RecordData, settings: &AppSettings, today: NaiveDate) -> Self {
        let table = InteractiveTable::load(settings, &records.summary(), today.year());
        let range = table.range();
        let iso = today.iso_week();
        let (cursor_year, cursor_week) = if range.contains(iso.year()) {
            (iso.year(), iso.week())
        } else {
            (range.max, FIRST_WEEK)
        };
        App {
            table,
            records,
            cursor_year,
            cursor_week,
            mode: Mode::Normal,
            menu_index: 0,
            form: None,
            status: None,
            first_week: FIRST_WEEK,
            first_year: range.min,
            grid_area: Rect::default(),
        }
    }

    fn cursor_id(&self) -> String {
        self.table.grid().cell_id(self.cursor_year, self.cursor_week)
    }

    fn resync(&mut self) {
        let report = self.table.resync(&self.records.summary());
        if !report.unknown.is_empty() {
            self.status = Some((
                format!("{} record(s) outside the shown years", report.unknown.len()),
                Color::DarkGray,
            ));
        }
    }

    fn expand(&mut self, direction: Direction) {
        self.table.expand(direction, &self.records.summary());
        let range = self.table.range();
        self.cursor_year = match direction {
            Direction::Min => range.min,
            Direction::Max => range.max,
        };
    }

    fn open_menu(&mut self) {
        let id = self.cursor_id();
        match self.table.show(&id) {
            Ok(_) => {
                self.menu_index = 0;
                self.mode = Mode::Menu;
            }
            Err(e) => self.status = Some((e.to_string(), Color::Red)),
        }
    }

    fn close_menu(&mut self) {
        self.table.hide();
        self.mode = Mode::Normal;
    }

    fn choose(&mut self, action: MenuAction) {
        let mut actions = SessionActions {
            records: &mut *self.records,
            form: &mut self.form,
        };
        let result = self.table.select(action, &mut actions);
        self.table.hide();
        match result {
            Ok(MenuOutcome::Applied) => {
                if self.form.is_some() {
                    self.mode = Mode::Form;
                    return;
                }
                // Deletion already hit the store.
                self.resync();
                self.status = Some((format!("{} done", action.label()), Color::Green));
            }
            Ok(MenuOutcome::Guarded) => {
                self.status = Some((
                    format!("{} is not available for this week", action.label()),
                    Color::Yellow,
                ));
            }
            Ok(MenuOutcome::NotImplemented) => {
                self.status = Some(("Not implemented yet".to_string(), Color::DarkGray));
            }
            Err(e) => self.status = Some((e.to_string(), Color::Red)),
        }
        self.mode = Mode::Normal;
    }

    fn finish_form(&mut self, save: bool) {
        if let Some(cell) = self.form.take() {
            if save {
                self.records.add(Record::new(&cell.epiweek));
                self.status = Some((format!("Saved {}", cell.epiweek), Color::Green));
            }
        }
        self.resync();
        self.mode = Mode::Normal;
    }

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.status = None;

        match self.mode {
            Mode::Form => {
                match code {
                    KeyCode::Enter => self.finish_form(true),
                    KeyCode::Esc => self.finish_form(false),
                    _ => {}
                }
                false
            }

            Mode::Menu => {
                match code {
                    KeyCode::Up => {
                        self.menu_index = self.menu_index.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        if self.menu_index + 1 < MENU_ITEMS.len() {
                            self.menu_index += 1;
                        }
                    }
                    KeyCode::Enter => self.choose(MENU_ITEMS[self.menu_index]),
                    KeyCode::Char('a') => self.choose(MenuAction::Add),
                    KeyCode::Char('u') => self.choose(MenuAction::Update),
                    KeyCode::Char('d') => self.choose(MenuAction::Delete),
                    KeyCode::Char('r') => self.choose(MenuAction::Replace),
                    KeyCode::Esc => self.close_menu(),
                    _ => {}
                }
                false
            }

            Mode::Normal => {
                let range = self.table.range();
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => return true,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return true;
                    }
                    KeyCode::Left => {
                        if self.cursor_week > FIRST_WEEK {
                            self.cursor_week -= 1;
                        }
                    }
                    KeyCode::Right => {
                        if self.cursor_week < LAST_WEEK {
                            self.cursor_week += 1;
                        }
                    }
                    KeyCode::Up => {
                        if self.cursor_year > range.min {
                            self.cursor_year -= 1;
                        }
                    }
                    KeyCode::Down => {
                        if self.cursor_year < range.max {
                            self.cursor_year += 1;
                        }
                    }
                    KeyCode::Home => self.cursor_week = FIRST_WEEK,
                    KeyCode::End => self.cursor_week = LAST_WEEK,
                    KeyCode::Enter | KeyCode::Char('m') => self.open_menu(),
                    KeyCode::Char('[') => self.expand(Direction::Min),
                    KeyCode::Char(']') => self.expand(Direction::Max),
                    _ => {}
                }
                false
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode == Mode::Form {
            return;
        }
        let button = match mouse.kind {
            MouseEventKind::Down(b) => b,
            _ => return,
        };
        if self.mode == Mode::Menu {
            if let Some(index) = self.menu_hit(mouse.column, mouse.row) {
                if button == MouseButton::Left {
                    self.menu_index = index;
                    self.choose(MENU_ITEMS[index]);
                }
                return;
            }
            if rect_contains(self.menu_area(), mouse.column, mouse.row) {
                return;
            }
            // A click outside the popup dismisses the menu.
            self.close_menu();
        }
        let hit = self.hit_test(mouse.column, mouse.row);
        match (button, hit) {
            (MouseButton::Right, Some(Hit::Cell(year, week))) => {
                self.cursor_year = year;
                self.cursor_week = week;
                self.open_menu();
            }
            (MouseButton::Left, Some(Hit::Cell(year, week))) => {
                self.cursor_year = year;
                self.cursor_week = week;
            }
            (MouseButton::Left, Some(Hit::AddEarlier)) => self.expand(Direction::Min),
            (MouseButton::Left, Some(Hit::AddLater)) => self.expand(Direction::Max),
            _ => {}
        }
    }

    fn menu_area(&self) -> Rect {
        centered_rect(MENU_WIDTH, MENU_ITEMS.len() as u16 + 2, self.grid_area)
    }

    /// Index of the menu item under the pointer.
    fn menu_hit(&self, column: u16, row: u16) -> Option<usize> {
        let items = inner(self.menu_area());
        if !rect_contains(items, column, row) {
            return None;
        }
        let index = (row - items.y) as usize;
        (index < MENU_ITEMS.len()).then_some(index)
    }

    fn visible_weeks(&self) -> u32 {
        let inner = inner(self.grid_area);
        let width = inner.width.saturating_sub(ROW_HEADER_WIDTH) / CELL_WIDTH;
        (width as u32).clamp(1, LAST_WEEK)
    }

    fn visible_years(&self) -> usize {
        // header row and trailing "+" row
        (inner(self.grid_area).height.saturating_sub(2) as usize).max(1)
    }

    fn shown_years(&self) -> Vec<i32> {
        self.table
            .range()
            .years()
            .filter(|y| *y >= self.first_year)
            .take(self.visible_years())
            .collect()
    }

    fn hit_test(&self, column: u16, row: u16) -> Option<Hit> {
        let inner = inner(self.grid_area);
        if column < inner.x || row < inner.y || column >= inner.x + inner.width {
            return None;
        }
        let years = self.shown_years();
        let line = (row - inner.y) as usize;
        let x = column - inner.x;
        if x < ROW_HEADER_WIDTH {
            return match line {
                0 => Some(Hit::AddEarlier),
                l if l == years.len() + 1 => Some(Hit::AddLater),
                _ => None,
            };
        }
        if line == 0 || line > years.len() {
            return None;
        }
        let week = self.first_week + ((x - ROW_HEADER_WIDTH) / CELL_WIDTH) as u32;
        if week > LAST_WEEK || week >= self.first_week + self.visible_weeks() {
            return None;
        }
        Some(Hit::Cell(years[line - 1], week))
    }

    fn scroll_to_cursor(&mut self) {
        let range = self.table.range();
        self.cursor_year = self.cursor_year.clamp(range.min, range.max.max(range.min));
        self.first_week = scroll_offset(self.first_week, self.cursor_week, self.visible_weeks());
        let visible = self.visible_years() as i32;
        self.first_year = scroll_offset(self.first_year.max(range.min), self.cursor_year, visible);
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(1), // title / status
                Constraint::Min(5),    // grid
                Constraint::Length(3), // cell details + help
            ])
            .split(f.area());

        self.grid_area = chunks[1];
        self.scroll_to_cursor();

        self.render_status(f, chunks[0]);
        self.render_grid(f, chunks[1]);
        self.render_details(f, chunks[2]);

        match self.mode {
            Mode::Menu => self.render_menu(f, chunks[1]),
            Mode::Form => self.render_form(f, chunks[1]),
            Mode::Normal => {}
        }
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let range = self.table.range();
        let mut spans = vec![Span::styled(
            format!(" Epiweek records  {}-{} ", range.min, range.max),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if let Some((msg, color)) = &self.status {
            spans.push(Span::styled(format!("  {}", msg), Style::default().fg(*color)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_grid(&self, f: &mut Frame, area: Rect) {
        let visible = self.visible_weeks();
        let last_week = (self.first_week + visible - 1).min(LAST_WEEK);
        let weeks: Vec<u32> = (self.first_week..=last_week).collect();

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut header = vec![Cell::from("  +  ").style(bold)];
        header.extend(
            weeks
                .iter()
                .map(|w| Cell::from(format!("{:^3}", week_label(*w))).style(bold)),
        );

        let mut rows: Vec<Row> = Vec::new();
        for year in self.shown_years() {
            let mut cells = vec![Cell::from(format!("{:<6}", year)).style(bold)];
            for week in &weeks {
                let cell = match self.table.grid().get(year, *week) {
                    Some(c) => c,
                    None => continue,
                };
                let is_cursor = year == self.cursor_year && *week == self.cursor_week;
                cells.push(
                    Cell::from(format!("{:^3}", cell.text())).style(cell_style(cell, is_cursor)),
                );
            }
            rows.push(Row::new(cells));
        }
        rows.push(Row::new(vec![Cell::from("  +  ").style(bold)]));

        let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)];
        widths.extend(weeks.iter().map(|_| Constraint::Length(CELL_WIDTH)));
        widths.push(Constraint::Min(0));

        let table = Table::new(rows, widths)
            .header(Row::new(header))
            .column_spacing(0)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", self.table.target())),
            );
        f.render_widget(table, area);
    }

    fn details_line(&self) -> String {
        let epiweek = yrwk_to_epiwk(self.cursor_year, self.cursor_week);
        let starts = week_start(self.cursor_year, self.cursor_week)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = self
            .table
            .grid()
            .get(self.cursor_year, self.cursor_week)
            .map(|c| match c.state() {
                CellState::Empty => "no record",
                CellState::Validated => "validated",
                CellState::Pending => "updating",
            })
            .unwrap_or("-");
        let mut line = format!(
            " {}  week starting {}  {}   records: {}",
            epiweek,
            starts,
            state,
            self.records.records.len()
        );
        if let Some(last) = self.table.last_interaction() {
            line.push_str(&format!("   last: {}", last.epiweek));
        }
        line
    }

    fn render_details(&self, f: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(self.details_line()),
            Line::from(Span::styled(
                " ←→↑↓=move  Enter/m/right-click=menu  [=earlier  ]=later  q=quit",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(Paragraph::new(lines), area);
    }

    fn render_menu(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(MENU_WIDTH, MENU_ITEMS.len() as u16 + 2, area);
        let items: Vec<ListItem> = MENU_ITEMS
            .iter()
            .map(|a| ListItem::new(format!(" {}", a.label())))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.menu_index));
        let title = self
            .table
            .open_menu()
            .map(|c| format!(" {} ", c.epiweek))
            .unwrap_or_default();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(Clear, popup);
        f.render_stateful_widget(list, popup, &mut state);
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let cell = match &self.form {
            Some(c) => c,
            None => return,
        };
        let popup = centered_rect(44, 5, area);
        let lines = vec![
            Line::from(format!(" Record data for epiweek {}", cell.epiweek)),
            Line::from(""),
            Line::from(Span::styled(
                " Enter=save  Esc=cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let p = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Add IDSR data "),
        );
        f.render_widget(Clear, popup);
        f.render_widget(p, popup);
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            match event::read()? {
                CEvent::Key(key) => {
                    if app.handle_key(key.code, key.modifiers) {
                        break;
                    }
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

// ── Grid helpers ──────────────────────────────────────────────────────────────

/// Style for a grid cell: markers drive the background, the cursor is reversed.
pub(crate) fn cell_style(cell: &CellView, is_cursor: bool) -> Style {
    let mut style = match cell.state() {
        CellState::Validated => Style::default()
            .fg(Color::Black)
            .bg(VALIDATED_BG)
            .add_modifier(Modifier::BOLD),
        CellState::Pending => Style::default().fg(Color::Black).bg(UPDATING_BG),
        CellState::Empty => Style::default().add_modifier(Modifier::DIM),
    };
    if cell.has_marker(Marker::Clicked) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if is_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

/// Keeps `cursor` inside a window of `visible` items starting at `offset`.
pub(crate) fn scroll_offset<T>(offset: T, cursor: T, visible: T) -> T
where
    T: Copy + Ord + std::ops::Add<Output = T> + std::ops::Sub<Output = T> + From<u8>,
{
    if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + T::from(1) - visible
    } else {
        offset
    }
}

fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn rect_contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
