//! Header row discovery and column-role mapping (1-based rows/cols).

use calamine::{Data, DataType, Range};
use serde::{Deserialize, Serialize};

use crate::models::{ColumnMap, ColumnRole, LayoutSource, SheetLayout};

/// Rows scanned for a header. Templates keep their header near the top; data
/// rows further down may contain keyword substrings.
pub const HEADER_SCAN_ROWS: u32 = 20;
/// Cells per row considered for header text and role matching.
pub const HEADER_SCAN_COLS: u32 = 19;

/// Text view of a worksheet. Empty or missing cells read as "".
pub trait CellGrid {
    fn cell_text(&self, row: u32, col: u32) -> String;
}

/// calamine range, addressed by absolute 1-based coordinates.
pub struct RangeGrid<'a>(pub &'a Range<Data>);

impl CellGrid for RangeGrid<'_> {
    fn cell_text(&self, row: u32, col: u32) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.0
            .get_value((row - 1, col - 1))
            .and_then(|c| c.as_string())
            .unwrap_or_default()
    }
}

/// In-memory grid; `rows[0]` is worksheet row 1.
#[derive(Debug, Clone, Default)]
pub struct StaticGrid {
    pub rows: Vec<Vec<String>>,
}

impl StaticGrid {
    pub fn single_row(cells: &[String]) -> Self {
        Self {
            rows: vec![cells.to_vec()],
        }
    }
}

impl CellGrid for StaticGrid {
    fn cell_text(&self, row: u32, col: u32) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
            .cloned()
            .unwrap_or_default()
    }
}

/// Keyword rule table. `header_markers` decide which row is the header;
/// `roles` are tried per cell in order, first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRules {
    pub header_markers: Vec<String>,
    pub roles: Vec<RoleRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRule {
    pub role: ColumnRole,
    pub keywords: Vec<String>,
}

const HEADER_MARKERS: &[&str] = &["問", "No", "判定", "Status"];

const ROLE_KEYWORDS: &[(ColumnRole, &[&str])] = &[
    (ColumnRole::QuestionNumber, &["問", "No"]),
    (ColumnRole::Topic, &["単元", "ジャンル", "Unit"]),
    (ColumnRole::Mark, &["結果", "Result", "マーク"]),
    (ColumnRole::Status, &["判定", "Status", "正解"]),
];

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            header_markers: HEADER_MARKERS.iter().map(|s| s.to_string()).collect(),
            roles: ROLE_KEYWORDS
                .iter()
                .map(|(role, keywords)| RoleRule {
                    role: *role,
                    keywords: keywords.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl HeaderRules {
    pub fn is_header_text(&self, row_text: &str) -> bool {
        self.header_markers.iter().any(|k| row_text.contains(k.as_str()))
    }

    /// Role of a single header cell, by rule priority.
    pub fn role_for(&self, cell_text: &str) -> Option<ColumnRole> {
        self.roles
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| cell_text.contains(k.as_str())))
            .map(|rule| rule.role)
    }
}

/// Concatenation of the first HEADER_SCAN_COLS cells of `row`.
fn row_text(grid: &dyn CellGrid, row: u32) -> String {
    (1..=HEADER_SCAN_COLS).map(|col| grid.cell_text(row, col)).collect()
}

/// First row in 1..=HEADER_SCAN_ROWS whose text contains a header marker.
pub fn detect_header_row(grid: &dyn CellGrid, rules: &HeaderRules) -> Option<u32> {
    (1..=HEADER_SCAN_ROWS).find(|&row| rules.is_header_text(&row_text(grid, row)))
}

/// Left to right over the header cells; each column gets at most one role and
/// each role keeps its left-most column.
pub fn map_columns(grid: &dyn CellGrid, header_row: u32, rules: &HeaderRules) -> ColumnMap {
    let mut map = ColumnMap::default();
    for col in 1..=HEADER_SCAN_COLS {
        let text = grid.cell_text(header_row, col);
        if let Some(role) = rules.role_for(&text) {
            map.assign_if_absent(role, col);
        }
    }
    map
}

/// Header row and column map of `grid`, or the default layout (row 1,
/// columns 1..=4) when no header is recognized.
pub fn locate_or_default(grid: &dyn CellGrid, rules: &HeaderRules) -> SheetLayout {
    let Some(header_row) = detect_header_row(grid, rules) else {
        tracing::info!("No header row in rows 1..={}, using default layout", HEADER_SCAN_ROWS);
        return SheetLayout::default_layout();
    };
    let columns = map_columns(grid, header_row, rules);
    if columns.is_empty() {
        // marker text split across cells: nothing addressable to write into
        tracing::info!(header_row, "Header row has no role columns, using default layout");
        return SheetLayout::default_layout();
    }
    tracing::debug!(header_row, ?columns, "Header row located");
    SheetLayout {
        header_row,
        columns,
        source: LayoutSource::Discovered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> StaticGrid {
        StaticGrid {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn finds_header_on_row_five() {
        let g = grid(&[
            &["Mid-term exam"],
            &[],
            &["Class", "3-B"],
            &[],
            &["No.", "Unit", "Result", "Status"],
            &["", "", "", ""],
        ]);
        let layout = locate_or_default(&g, &HeaderRules::default());
        assert_eq!(layout.header_row, 5);
        assert_eq!(layout.source, LayoutSource::Discovered);
        assert_eq!(layout.columns.get(ColumnRole::QuestionNumber), Some(1));
        assert_eq!(layout.columns.get(ColumnRole::Topic), Some(2));
        assert_eq!(layout.columns.get(ColumnRole::Mark), Some(3));
        assert_eq!(layout.columns.get(ColumnRole::Status), Some(4));
    }

    #[test]
    fn falls_back_without_keywords() {
        let g = grid(&[&["Name", "Score"], &["Alice", "90"], &["Bob", "75"]]);
        let layout = locate_or_default(&g, &HeaderRules::default());
        assert_eq!(layout, SheetLayout::default_layout());
        assert_eq!(layout.columns, ColumnMap::default_layout());
    }

    #[test]
    fn ignores_headers_below_scan_window() {
        let mut rows: Vec<Vec<String>> = vec![vec![]; 20];
        rows.push(vec!["No.".into(), "Status".into()]);
        let layout = locate_or_default(&StaticGrid { rows }, &HeaderRules::default());
        assert_eq!(layout.source, LayoutSource::Default);
    }

    #[test]
    fn maps_shuffled_mixed_language_columns() {
        let g = grid(&[&["判定(Status)", "結果(Result)", "ジャンル(Unit)", "No."]]);
        let layout = locate_or_default(&g, &HeaderRules::default());
        assert_eq!(layout.header_row, 1);
        assert_eq!(layout.columns.get(ColumnRole::Status), Some(1));
        assert_eq!(layout.columns.get(ColumnRole::Mark), Some(2));
        assert_eq!(layout.columns.get(ColumnRole::Topic), Some(3));
        assert_eq!(layout.columns.get(ColumnRole::QuestionNumber), Some(4));
    }

    #[test]
    fn rule_priority_resolves_ambiguous_cell() {
        let rules = HeaderRules::default();
        // number keyword outranks status keyword in the same cell
        assert_eq!(rules.role_for("No. / 判定"), Some(ColumnRole::QuestionNumber));
        assert_eq!(rules.role_for("Unit result"), Some(ColumnRole::Topic));
        assert_eq!(rules.role_for("正解"), Some(ColumnRole::Status));
        assert_eq!(rules.role_for("Comment"), None);
    }

    #[test]
    fn left_most_duplicate_wins() {
        let g = grid(&[&["No.", "Unit", "Unit (alt)", "Status", "Status 2"]]);
        let layout = locate_or_default(&g, &HeaderRules::default());
        assert_eq!(layout.columns.get(ColumnRole::Topic), Some(2));
        assert_eq!(layout.columns.get(ColumnRole::Status), Some(4));
        assert_eq!(layout.columns.get(ColumnRole::Mark), None);
    }

    #[test]
    fn only_first_nineteen_columns_count() {
        let mut row = vec![String::new(); 19];
        row.push("Status".into());
        let layout = locate_or_default(&StaticGrid { rows: vec![row] }, &HeaderRules::default());
        assert_eq!(layout.source, LayoutSource::Default);
    }

    #[test]
    fn marker_split_across_cells_falls_back() {
        let g = grid(&[&["N", "o"]]);
        let layout = locate_or_default(&g, &HeaderRules::default());
        assert_eq!(layout, SheetLayout::default_layout());
    }

    #[test]
    fn default_headers_match_their_own_rules() {
        for labels in [
            crate::config::ReportLabels::default(),
            crate::config::ReportLabels::japanese(),
        ] {
            let g = StaticGrid::single_row(&labels.default_headers);
            let layout = locate_or_default(&g, &HeaderRules::default());
            assert_eq!(layout.header_row, 1);
            assert_eq!(layout.source, LayoutSource::Discovered);
            assert_eq!(layout.columns, ColumnMap::default_layout());
        }
    }
}
