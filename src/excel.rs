//! Workbook backends behind [`ReportSheet`]: rust_xlsxwriter for synthesized
//! workbooks, edit-xlsx for template copies (keeps the template's styles).

mod chart_part;
mod drawing_layer;
mod package;

use calamine::{open_workbook_auto, Data, Range, Reader};
use edit_xlsx::{FormatAlignType, FormatBorderType, FormatColor, Write as SheetWrite};
use rust_xlsxwriter::{Chart, ChartType, Color, Format, FormatAlign, FormatBorder, Workbook};
use std::path::Path;

use crate::error::{ReportError, Result};
use crate::models::CellPosition;
use crate::services::template_locator::StaticGrid;
use crate::types::MarkClass;

pub use chart_part::embed_bar_chart;

use drawing_layer::restore_drawing_layer;

const POSITIVE_RGB: u32 = 0xFF0000;
const NEGATIVE_RGB: u32 = 0x0000FF;
const HEADER_BG_RGB: u32 = 0x2563EB;

/// Column index to Excel letter (1→A, 26→Z, 27→AA).
pub fn col_letter(col: u32) -> String {
    let mut n = col.saturating_sub(1);
    let mut s = String::new();
    loop {
        let r = (n % 26) as u8;
        s.insert(0, (b'A' + r) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// "B7" for row 7, column 2.
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_letter(col), row)
}

/// 1-based (row, col) to 0-based indices; rejects 0 and columns past u16.
fn zero_based(row: u32, col: u32) -> Result<(u32, u16)> {
    match (
        row.checked_sub(1),
        col.checked_sub(1).and_then(|c| u16::try_from(c).ok()),
    ) {
        (Some(r), Some(c)) => Ok((r, c)),
        _ => Err(ReportError::Workbook(format!(
            "Invalid cell position: row {}, column {}",
            row, col
        ))),
    }
}

fn is_xml_char(c: char) -> bool {
    let u = c as u32;
    c == '\t' || c == '\n' || c == '\r' || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
}

/// Drops control chars (except tab, newline, CR). Enough for rust_xlsxwriter,
/// which escapes markup itself.
pub fn strip_control_chars(s: &str) -> String {
    s.chars().filter(|&c| is_xml_char(c)).collect()
}

/// [`strip_control_chars`] plus replacement of & < > so cells edit-xlsx
/// writes into template XML are never broken.
pub fn sanitize_cell(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => out.push_str(" and "),
            '<' | '>' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Estimate column width from text length (char count × 1.2, clamped 10–50).
fn estimate_text_width(text: &str) -> f64 {
    let w = text.chars().count() as f64 * 1.2;
    w.clamp(10.0, 50.0)
}

/// Visual encoding of a written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    /// Bold label on a colored band.
    Header,
    /// Thin border on every side.
    Bordered,
    /// Bordered, centered, colored by outcome.
    Mark(MarkClass),
    /// Percentage with one decimal.
    Rate,
}

impl CellStyle {
    fn emphasis(self) -> Option<u32> {
        match self {
            CellStyle::Mark(MarkClass::Correct) => Some(POSITIVE_RGB),
            CellStyle::Mark(MarkClass::Incorrect | MarkClass::Unknown) => Some(NEGATIVE_RGB),
            _ => None,
        }
    }

    fn xlsxwriter_format(self) -> Format {
        let mut format = Format::new();
        match self {
            CellStyle::Plain => {}
            CellStyle::Header => {
                format = format
                    .set_bold()
                    .set_background_color(Color::RGB(HEADER_BG_RGB))
                    .set_font_color(Color::RGB(0xFFFFFF))
                    .set_border(FormatBorder::Thin);
            }
            CellStyle::Bordered => format = format.set_border(FormatBorder::Thin),
            CellStyle::Mark(_) => {
                format = format.set_border(FormatBorder::Thin).set_align(FormatAlign::Center);
                if let Some(rgb) = self.emphasis() {
                    format = format.set_bold().set_font_color(Color::RGB(rgb));
                }
            }
            CellStyle::Rate => format = format.set_num_format("0.0"),
        }
        format
    }

    fn edit_format(self) -> edit_xlsx::Format {
        let mut format = edit_xlsx::Format::default();
        match self {
            CellStyle::Plain | CellStyle::Rate => {}
            CellStyle::Header => format = format.set_bold().set_border(FormatBorderType::Thin),
            CellStyle::Bordered => format = format.set_border(FormatBorderType::Thin),
            CellStyle::Mark(_) => {
                format = format
                    .set_border(FormatBorderType::Thin)
                    .set_align(FormatAlignType::Center);
                if let Some(rgb) = self.emphasis() {
                    format = format.set_bold().set_color(FormatColor::RGB(
                        (rgb >> 16) as u8,
                        (rgb >> 8) as u8,
                        rgb as u8,
                    ));
                }
            }
        }
        format
    }
}

/// Vertical run of cells in one column (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub col: u32,
    pub first_row: u32,
    pub last_row: u32,
}

/// Clustered column chart over a two-column aggregate table.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartSpec {
    pub title: String,
    /// Cell holding the series name (the rate column header).
    pub series_name: CellPosition,
    pub categories: ColumnSpan,
    pub values: ColumnSpan,
    /// Top-left cell the chart is placed at.
    pub anchor: CellPosition,
}

/// Writer-facing worksheet. Coordinates are 1-based.
pub trait ReportSheet {
    fn sheet_name(&self) -> &str;
    fn write_text(&mut self, row: u32, col: u32, text: &str, style: CellStyle) -> Result<()>;
    fn write_number(&mut self, row: u32, col: u32, value: f64, style: CellStyle) -> Result<()>;
    fn insert_bar_chart(&mut self, chart: &BarChartSpec) -> Result<()>;
}

/// Freshly synthesized single-sheet workbook.
pub struct FreshSheet {
    workbook: Workbook,
    name: String,
    headers: Vec<String>,
}

impl FreshSheet {
    /// New workbook whose row 1 holds `headers`.
    pub fn new(sheet_name: &str, headers: &[String]) -> Result<Self> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let name = match worksheet.set_name(sheet_name) {
            Ok(_) => sheet_name.to_string(),
            Err(e) => {
                tracing::warn!(sheet_name, error = %e, "Invalid sheet name, keeping Sheet1");
                "Sheet1".to_string()
            }
        };
        let header_format = CellStyle::Header.xlsxwriter_format();
        for (idx, header) in headers.iter().enumerate() {
            let col = idx as u16;
            worksheet.write_string_with_format(0, col, strip_control_chars(header), &header_format)?;
            worksheet.set_column_width(col, estimate_text_width(header))?;
        }
        Ok(Self {
            workbook,
            name,
            headers: headers.to_vec(),
        })
    }

    /// The synthesized header row as a grid, for layout discovery.
    pub fn header_grid(&self) -> StaticGrid {
        StaticGrid::single_row(&self.headers)
    }

    fn worksheet(&mut self) -> Result<&mut rust_xlsxwriter::Worksheet> {
        Ok(self.workbook.worksheet_from_index(0)?)
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

impl ReportSheet for FreshSheet {
    fn sheet_name(&self) -> &str {
        &self.name
    }

    fn write_text(&mut self, row: u32, col: u32, text: &str, style: CellStyle) -> Result<()> {
        let (row, col) = zero_based(row, col)?;
        let format = style.xlsxwriter_format();
        self.worksheet()?
            .write_string_with_format(row, col, strip_control_chars(text), &format)?;
        Ok(())
    }

    fn write_number(&mut self, row: u32, col: u32, value: f64, style: CellStyle) -> Result<()> {
        let (row, col) = zero_based(row, col)?;
        let format = style.xlsxwriter_format();
        self.worksheet()?
            .write_number_with_format(row, col, value, &format)?;
        Ok(())
    }

    fn insert_bar_chart(&mut self, spec: &BarChartSpec) -> Result<()> {
        let sheet = self.name.clone();
        let name = zero_based(spec.series_name.row, spec.series_name.col)?;
        let (cat_first, cat_col) = zero_based(spec.categories.first_row, spec.categories.col)?;
        let (cat_last, _) = zero_based(spec.categories.last_row, spec.categories.col)?;
        let (val_first, val_col) = zero_based(spec.values.first_row, spec.values.col)?;
        let (val_last, _) = zero_based(spec.values.last_row, spec.values.col)?;
        let (anchor_row, anchor_col) = zero_based(spec.anchor.row, spec.anchor.col)?;

        let mut chart = Chart::new(ChartType::Column);
        chart.title().set_name(spec.title.as_str());
        chart
            .add_series()
            .set_name((sheet.as_str(), name.0, name.1))
            .set_categories((sheet.as_str(), cat_first, cat_col, cat_last, cat_col))
            .set_values((sheet.as_str(), val_first, val_col, val_last, val_col));
        self.worksheet()?.insert_chart(anchor_row, anchor_col, &chart)?;
        Ok(())
    }
}

/// Copy of a user template, opened with edit-xlsx. The chart is recorded and
/// grafted into the saved package by [`TemplateSheet::into_bytes`].
pub struct TemplateSheet {
    workbook: edit_xlsx::Workbook,
    sheet_name: String,
    chart: Option<BarChartSpec>,
    /// Template package as read, source of its drawing layer.
    template: Vec<u8>,
}

/// Opens `path` twice: calamine for cell text (layout discovery) and
/// edit-xlsx for writing. The first worksheet is the report sheet.
pub fn open_template(path: &Path) -> Result<(TemplateSheet, Range<Data>)> {
    if !path.exists() {
        return Err(ReportError::Workbook(format!(
            "Template not found: {}",
            path.display()
        )));
    }
    let template = std::fs::read(path).map_err(|e| ReportError::io(path, e))?;
    let mut book = open_workbook_auto(path)
        .map_err(|e| ReportError::Workbook(format!("Could not open Excel file: {}", e)))?;
    let sheet_name = book
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReportError::Workbook("Workbook has no worksheets".to_string()))?;
    let range = book
        .worksheet_range(&sheet_name)
        .map_err(|e| ReportError::Workbook(format!("Sheet not found: {}", e)))?;
    let workbook = edit_xlsx::Workbook::from_path(path)
        .map_err(|e| ReportError::Workbook(format!("Could not open Excel file: {}", e)))?;
    Ok((
        TemplateSheet {
            workbook,
            sheet_name,
            chart: None,
            template,
        },
        range,
    ))
}

impl TemplateSheet {
    /// Saves through a scratch file (edit-xlsx writes to paths only), puts
    /// the template's pictures, charts and notes back, then grafts the
    /// pending chart. A failed graft keeps the chart-less package and
    /// reports the reason.
    pub fn into_bytes(self) -> Result<RenderedWorkbook> {
        let scratch = tempfile::tempdir().map_err(|e| ReportError::io(std::env::temp_dir(), e))?;
        let scratch_path = scratch.path().join("report.xlsx");
        self.workbook
            .save_as(&scratch_path)
            .map_err(|e| ReportError::Workbook(format!("Cannot write workbook: {}", e)))?;
        let saved = std::fs::read(&scratch_path).map_err(|e| ReportError::io(&scratch_path, e))?;

        let (bytes, dropped_parts) = match restore_drawing_layer(&saved, &self.template) {
            Ok(restored) => (restored.bytes, restored.dropped),
            Err(e) => {
                tracing::warn!(error = %e, "Template drawing layer could not be restored");
                (saved, vec![format!("drawing layer ({})", e)])
            }
        };
        if !dropped_parts.is_empty() {
            tracing::warn!(parts = ?dropped_parts, "Template content dropped from report");
        }

        let Some(spec) = self.chart else {
            return Ok(RenderedWorkbook {
                bytes,
                chart_skipped: None,
                dropped_parts,
            });
        };
        match embed_bar_chart(&bytes, &self.sheet_name, &spec) {
            Ok(with_chart) => Ok(RenderedWorkbook {
                bytes: with_chart,
                chart_skipped: None,
                dropped_parts,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Chart could not be added to template copy");
                Ok(RenderedWorkbook {
                    bytes,
                    chart_skipped: Some(e.to_string()),
                    dropped_parts,
                })
            }
        }
    }
}

impl ReportSheet for TemplateSheet {
    fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn write_text(&mut self, row: u32, col: u32, text: &str, style: CellStyle) -> Result<()> {
        zero_based(row, col)?;
        let format = style.edit_format();
        let target = cell_ref(row, col);
        let worksheet = self
            .workbook
            .get_worksheet_mut_by_name(&self.sheet_name)
            .map_err(|e| ReportError::Workbook(format!("Sheet not found: {}", e)))?;
        worksheet
            .write_string_with_format(&target, sanitize_cell(text), &format)
            .map_err(|e| ReportError::Workbook(e.to_string()))?;
        Ok(())
    }

    fn write_number(&mut self, row: u32, col: u32, value: f64, style: CellStyle) -> Result<()> {
        zero_based(row, col)?;
        let format = style.edit_format();
        let target = cell_ref(row, col);
        let worksheet = self
            .workbook
            .get_worksheet_mut_by_name(&self.sheet_name)
            .map_err(|e| ReportError::Workbook(format!("Sheet not found: {}", e)))?;
        worksheet
            .write_with_format(&target, value, &format)
            .map_err(|e| ReportError::Workbook(e.to_string()))?;
        Ok(())
    }

    fn insert_bar_chart(&mut self, spec: &BarChartSpec) -> Result<()> {
        self.chart = Some(spec.clone());
        Ok(())
    }
}

/// The workbook a report is written into.
pub enum ReportWorkbook {
    Fresh(FreshSheet),
    Template(TemplateSheet),
}

/// Serialized artifact plus what could not be carried into it.
#[derive(Debug)]
pub struct RenderedWorkbook {
    pub bytes: Vec<u8>,
    /// Why the chart was dropped while rendering.
    pub chart_skipped: Option<String>,
    /// Template drawing-layer parts left out of the report.
    pub dropped_parts: Vec<String>,
}

impl ReportWorkbook {
    pub fn render(self) -> Result<RenderedWorkbook> {
        match self {
            ReportWorkbook::Fresh(sheet) => Ok(RenderedWorkbook {
                bytes: sheet.into_bytes()?,
                chart_skipped: None,
                dropped_parts: Vec::new(),
            }),
            ReportWorkbook::Template(sheet) => sheet.into_bytes(),
        }
    }
}

impl ReportSheet for ReportWorkbook {
    fn sheet_name(&self) -> &str {
        match self {
            ReportWorkbook::Fresh(s) => s.sheet_name(),
            ReportWorkbook::Template(s) => s.sheet_name(),
        }
    }

    fn write_text(&mut self, row: u32, col: u32, text: &str, style: CellStyle) -> Result<()> {
        match self {
            ReportWorkbook::Fresh(s) => s.write_text(row, col, text, style),
            ReportWorkbook::Template(s) => s.write_text(row, col, text, style),
        }
    }

    fn write_number(&mut self, row: u32, col: u32, value: f64, style: CellStyle) -> Result<()> {
        match self {
            ReportWorkbook::Fresh(s) => s.write_number(row, col, value, style),
            ReportWorkbook::Template(s) => s.write_number(row, col, value, style),
        }
    }

    fn insert_bar_chart(&mut self, spec: &BarChartSpec) -> Result<()> {
        match self {
            ReportWorkbook::Fresh(s) => s.insert_bar_chart(spec),
            ReportWorkbook::Template(s) => s.insert_bar_chart(spec),
        }
    }
}
