//! Writes graded entries, the per-topic aggregate block and its chart into a
//! [`ReportSheet`] (1-based rows/cols).

use crate::config::ReportLabels;
use crate::error::Result;
use crate::excel::{BarChartSpec, CellStyle, ColumnSpan, ReportSheet};
use crate::models::{CellPosition, ColumnRole, SheetLayout};
use crate::types::{GradingEntry, ReportSummary, TopicAggregates};

/// Charts are never placed above this row.
const MIN_CHART_ROW: u32 = 10;

/// Where things ended up on the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenReport {
    pub data_rows: u32,
    pub aggregate_column: u32,
    pub student_name_cell: Option<CellPosition>,
    /// Chart spec handed to the sheet, if any.
    pub chart: Option<BarChartSpec>,
    /// Why no chart was written.
    pub chart_skipped: Option<String>,
}

pub struct ReportWriter<'a> {
    pub labels: &'a ReportLabels,
    pub student_name_cell: CellPosition,
}

impl<'a> ReportWriter<'a> {
    pub fn new(labels: &'a ReportLabels, student_name_cell: CellPosition) -> Self {
        Self {
            labels,
            student_name_cell,
        }
    }

    pub fn write<S: ReportSheet + ?Sized>(
        &self,
        sheet: &mut S,
        layout: &SheetLayout,
        entries: &[GradingEntry],
        aggregates: &TopicAggregates,
        summary: &ReportSummary,
        student_name: Option<&str>,
    ) -> Result<WrittenReport> {
        let first_row = layout.first_data_row();
        for (i, entry) in entries.iter().enumerate() {
            let row = first_row + i as u32;
            for (role, col) in layout.columns.iter() {
                let (text, style) = self.entry_cell(entry, role);
                sheet.write_text(row, col, &text, style)?;
            }
        }

        let student_name_cell = match student_name {
            Some(name) => {
                let cell = self.name_cell(layout);
                sheet.write_text(cell.row, cell.col, name, CellStyle::Plain)?;
                Some(cell)
            }
            None => None,
        };

        let max_col = layout
            .columns
            .max_column()
            .unwrap_or(ColumnRole::ALL.len() as u32);
        let agg_col = max_col + 2;
        sheet.write_text(1, agg_col, &self.labels.aggregate_topic_header, CellStyle::Header)?;
        sheet.write_text(1, agg_col + 1, &self.labels.aggregate_rate_header, CellStyle::Header)?;
        let mut row = 1;
        for topic in aggregates {
            row += 1;
            sheet.write_text(row, agg_col, &topic.topic, CellStyle::Bordered)?;
            sheet.write_number(row, agg_col + 1, topic.accuracy(), CellStyle::Rate)?;
        }
        let last_topic_row = row;
        let score_row = last_topic_row + 2;
        sheet.write_text(score_row, agg_col, &self.labels.score_label, CellStyle::Bordered)?;
        sheet.write_text(score_row, agg_col + 1, &summary.score_text(), CellStyle::Bordered)?;

        let (chart, chart_skipped) = if aggregates.is_empty() {
            tracing::debug!("No topics, chart not written");
            (None, Some("no topics to chart".to_string()))
        } else {
            let spec = BarChartSpec {
                title: self.labels.chart_title.clone(),
                series_name: CellPosition::new(1, agg_col + 1),
                categories: ColumnSpan {
                    col: agg_col,
                    first_row: 2,
                    last_row: last_topic_row,
                },
                values: ColumnSpan {
                    col: agg_col + 1,
                    first_row: 2,
                    last_row: last_topic_row,
                },
                anchor: CellPosition::new(MIN_CHART_ROW.max(score_row + 2), agg_col),
            };
            match sheet.insert_bar_chart(&spec) {
                Ok(()) => (Some(spec), None),
                Err(e) => {
                    tracing::warn!(error = %e, "Chart skipped");
                    (None, Some(e.to_string()))
                }
            }
        };

        Ok(WrittenReport {
            data_rows: entries.len() as u32,
            aggregate_column: agg_col,
            student_name_cell,
            chart,
            chart_skipped,
        })
    }

    fn entry_cell(&self, entry: &GradingEntry, role: ColumnRole) -> (String, CellStyle) {
        match role {
            ColumnRole::QuestionNumber => (
                self.labels.question_label(entry.question_number),
                CellStyle::Bordered,
            ),
            ColumnRole::Topic => (entry.topic.clone(), CellStyle::Bordered),
            ColumnRole::Mark => (
                self.labels.mark_symbol(entry.outcome).to_string(),
                CellStyle::Mark(entry.outcome),
            ),
            ColumnRole::Status => (entry.status_label.clone(), CellStyle::Bordered),
        }
    }

    /// Configured anchor, moved right of the data columns when it would
    /// overwrite a mapped header cell.
    fn name_cell(&self, layout: &SheetLayout) -> CellPosition {
        let cell = self.student_name_cell;
        if cell.row == layout.header_row && layout.columns.contains_column(cell.col) {
            let gap = layout.columns.max_column().unwrap_or(0) + 1;
            return CellPosition::new(layout.header_row, gap);
        }
        cell
    }
}
