//! Prints what the template locator sees in a workbook.
//! Usage: dump_layout <template.xlsx>

use calamine::{open_workbook_auto, Reader};
use grade_report::excel::col_letter;
use grade_report::services::template_locator::{locate_or_default, CellGrid, RangeGrid, HEADER_SCAN_COLS};
use grade_report::{HeaderRules, LayoutSource};

fn main() {
    grade_report::init_logging();
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: dump_layout <template.xlsx>");
        std::process::exit(2);
    };
    if let Err(e) = run(&path) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(path: &str) -> Result<(), String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| format!("Could not open {}: {}", path, e))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("Workbook has no worksheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Sheet not found: {}", e))?;
    let grid = RangeGrid(&range);
    let layout = locate_or_default(&grid, &HeaderRules::default());

    println!("sheet: {}", sheet_name);
    match layout.source {
        LayoutSource::Discovered => println!("header row: {}", layout.header_row),
        LayoutSource::Default => println!("header row: not recognized, default layout"),
    }
    for col in 1..=HEADER_SCAN_COLS {
        let text = grid.cell_text(layout.header_row, col);
        if !text.is_empty() {
            println!("  {}{}: {}", col_letter(col), layout.header_row, text);
        }
    }
    for (role, col) in layout.columns.iter() {
        println!("{:?} -> {}", role, col_letter(col));
    }
    Ok(())
}
