use crate::calc::{week_label, FIRST_WEEK, LAST_WEEK};
use crate::table::grid::Grid;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const CSS: &str = r#"
td.menu { text-align: center; cursor: context-menu; }
td.validated { background: #90C3D4; }
td.updating { background: #F2D16B; }
td.clicked { outline: 2px solid #2E6DA4; }
th.colh, td.rowh { font-weight: bold; }
"#;

/// Table fragment that replaces the target container's contents.
pub fn table_markup(grid: &Grid) -> Markup {
    html! {
        div."col-md-12" {
            table style="width:100%; font-size:1em;" {
                tr {
                    th { (add_row_button("min")) }
                    @for week in FIRST_WEEK..=LAST_WEEK {
                        th.colh { (week_label(week)) }
                    }
                }
                @for year in grid.range().years() {
                    tr {
                        td.rowh { (year) }
                        @for week in FIRST_WEEK..=LAST_WEEK {
                            @if let Some(cell) = grid.get(year, week) {
                                td class=(cell.class_attr()) id=(grid.cell_id(year, week)) {
                                    (cell.text())
                                }
                            }
                        }
                    }
                }
                tr {
                    td { (add_row_button("max")) }
                }
            }
        }
    }
}

fn add_row_button(direction: &str) -> Markup {
    let onclick = format!("addRow(\"{}\");", direction);
    html! {
        input type="button" style="width: 100%; font-size:0.8em;" value="+" onclick=(onclick);
    }
}

/// Standalone document: the table inside its target container, with marker styles.
pub fn render_page(grid: &Grid) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "Epiweek records" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div id=(grid.target()) {
                    (table_markup(grid))
                }
            }
        }
    }
}
